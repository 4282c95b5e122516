use std::sync::Arc;

use cqrs_es::{mem_store::MemStore, CqrsFramework};

use super::{MemViewRepository, Prescription, Query, Services};

pub type PrescriptionCqrs = CqrsFramework<Prescription, MemStore<Prescription>>;

pub fn init(repo: Arc<MemViewRepository>) -> Arc<PrescriptionCqrs> {
    let store = MemStore::<Prescription>::default();
    let query = Box::new(Query::new(repo));

    Arc::new(CqrsFramework::new(store, vec![query], Services::default()))
}

pub fn init_repo() -> Arc<MemViewRepository> {
    Arc::new(MemViewRepository::new())
}
