//! Crate-level test doubles and behaviour tests.

use mockall::mock;
use stagehand_core::{ColumnSet, Entity, PersistenceService, QueryExpression, ServiceFault};
use uuid::Uuid;


mock! {
    pub Store {}
    impl PersistenceService for Store {
        fn create(&self, entity: &Entity) -> Result<Uuid, ServiceFault>;
        fn update(&self, entity: &Entity) -> Result<(), ServiceFault>;
        fn retrieve(
            &self,
            logical_name: &str,
            id: Uuid,
            columns: &ColumnSet,
        ) -> Result<Entity, ServiceFault>;
        fn query(&self, query: &QueryExpression) -> Result<Vec<Entity>, ServiceFault>;
    }
}
