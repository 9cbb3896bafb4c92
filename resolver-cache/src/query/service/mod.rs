use {
    crate::{
        kernel::{
            coalescer::Coalescer,
            error::CacheError,
        },
        store::{
            EntityRecord,
            EntityStore,
        },
    },
    std::sync::Arc,
};

pub mod project;
pub mod resolve;

type FetchResult = Result<Arc<EntityRecord>, CacheError>;

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct ServiceInner {
    store:     Arc<EntityStore>,
    coalescer: Coalescer<FetchResult>,
}

impl Service {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self(Arc::new(ServiceInner {
            store,
            coalescer: Coalescer::new("entity_fetch"),
        }))
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Number of entity fetches currently in flight.
    pub fn fetches_in_flight(&self) -> usize {
        self.coalescer.in_flight()
    }
}
