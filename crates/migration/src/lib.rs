pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_post_and_member_tables;
mod m20250301_000002_create_email_send_tables;
mod m20250301_000003_create_email_event_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_post_and_member_tables::Migration),
            Box::new(m20250301_000002_create_email_send_tables::Migration),
            Box::new(m20250301_000003_create_email_event_table::Migration),
        ]
    }
}
