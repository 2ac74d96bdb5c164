//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they
//! depend only on the domain services and ports and remain testable
//! without real infrastructure.

use std::sync::Arc;

use pagination::Cursor;
use url::Url;

use crate::domain::ports::IdentityVerifier;
use crate::domain::{CarrierService, EntityLifecycle};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Entity lifecycle service: create/fetch/list/update/replace/delete.
    pub lifecycle: Arc<EntityLifecycle>,
    /// Carrier relationship service.
    pub carriers: Arc<CarrierService>,
    /// Bearer credential verifier.
    pub identity: Arc<dyn IdentityVerifier>,
    /// Public base URL of the API, used to build pagination links.
    pub public_base: Url,
}

impl HttpState {
    /// Build the `next` link for a collection page.
    ///
    /// `None` only when the collection segment cannot be joined onto the
    /// configured base URL.
    pub fn next_url(&self, segment: &str, cursor: &Cursor) -> Option<String> {
        self.public_base
            .join(segment)
            .ok()
            .map(|collection| pagination::next_link(&collection, cursor).into())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::CounterLedger;
    use crate::domain::ports::FixtureIdentityVerifier;
    use crate::outbound::MemoryDocumentStore;

    fn state(public_base: &str) -> HttpState {
        let store: Arc<MemoryDocumentStore> = Arc::new(MemoryDocumentStore::new());
        let counters = Arc::new(CounterLedger::new(store.clone()));
        HttpState {
            lifecycle: Arc::new(EntityLifecycle::new(store.clone(), Arc::clone(&counters))),
            carriers: Arc::new(CarrierService::new(store)),
            identity: Arc::new(FixtureIdentityVerifier::new()),
            public_base: Url::parse(public_base).expect("valid base url"),
        }
    }

    #[rstest]
    fn next_urls_carry_only_the_cursor() {
        let state = state("http://localhost:8080/api/v1/");
        let next = state.next_url("boats", &Cursor::from_token("abc".to_owned()));
        assert_eq!(
            next.as_deref(),
            Some("http://localhost:8080/api/v1/boats?cursor=abc")
        );
    }
}
