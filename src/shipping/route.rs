//! Shipping method route - lists the shipping methods of a sales channel.
//!
//! Routes are polymorphic so a deployment can wrap the base route with its own
//! implementation. The base route wraps nothing, so asking it for the route it
//! decorates is an error.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    EntitySearchResult, Filter, RequestParameters, SalesChannelContext, SearchCriteria,
    ShippingMethodCollection,
};
use crate::error::{StoreApiError, StoreApiResult};
use crate::storage::ShippingMethodRepository;

/// Name of the request flag narrowing the result to rule-eligible methods.
pub const ONLY_AVAILABLE: &str = "onlyAvailable";

/// Envelope returned by [`ShippingMethodRoute::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingMethodRouteResponse {
    result: EntitySearchResult<ShippingMethodCollection>,
}

impl ShippingMethodRouteResponse {
    pub fn new(result: EntitySearchResult<ShippingMethodCollection>) -> Self {
        Self { result }
    }

    pub fn result(&self) -> &EntitySearchResult<ShippingMethodCollection> {
        &self.result
    }

    pub fn shipping_methods(&self) -> &ShippingMethodCollection {
        self.result.entities()
    }

    pub fn into_result(self) -> EntitySearchResult<ShippingMethodCollection> {
        self.result
    }
}

/// Store API route loading shipping methods.
#[async_trait]
pub trait ShippingMethodRoute: Send + Sync {
    /// The route this one wraps.
    fn decorated(&self) -> StoreApiResult<&dyn ShippingMethodRoute>;

    /// Load the active shipping methods of the context's sales channel.
    ///
    /// `criteria` is extended in place with an `active == true` filter and the
    /// `media` association.
    async fn load(
        &self,
        params: &RequestParameters,
        context: &SalesChannelContext,
        criteria: &mut SearchCriteria,
    ) -> StoreApiResult<ShippingMethodRouteResponse>;
}

/// The route at the bottom of every decoration chain.
pub struct BaseShippingMethodRoute {
    repository: Arc<dyn ShippingMethodRepository>,
}

impl BaseShippingMethodRoute {
    pub fn new(repository: Arc<dyn ShippingMethodRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ShippingMethodRoute for BaseShippingMethodRoute {
    fn decorated(&self) -> StoreApiResult<&dyn ShippingMethodRoute> {
        Err(StoreApiError::DecorationPattern(
            std::any::type_name::<Self>().to_string(),
        ))
    }

    async fn load(
        &self,
        params: &RequestParameters,
        context: &SalesChannelContext,
        criteria: &mut SearchCriteria,
    ) -> StoreApiResult<ShippingMethodRouteResponse> {
        criteria
            .add_filter(Filter::equals("active", true))
            .add_association("media");

        let mut result = self.repository.search(criteria, context).await?;

        // total and aggregations keep describing the unfiltered search
        if params.boolean(ONLY_AVAILABLE, false) {
            let before = result.entities().len();
            result = result.map_entities(|methods| methods.filter_by_active_rules(context));

            tracing::debug!(
                sales_channel_id = %context.sales_channel_id(),
                before,
                after = result.entities().len(),
                "Filtered shipping methods by active rules"
            );
        }

        Ok(ShippingMethodRouteResponse::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SalesChannel, ShippingMethod};
    use serde_json::{json, Map};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Repository double returning a fixed result and recording the criteria it saw.
    struct FixedRepository {
        methods: Vec<ShippingMethod>,
        aggregations: Map<String, serde_json::Value>,
        seen: Mutex<Vec<SearchCriteria>>,
    }

    impl FixedRepository {
        fn new(methods: Vec<ShippingMethod>) -> Self {
            let mut aggregations = Map::new();
            aggregations.insert("methods".to_string(), json!({"count": methods.len()}));
            Self {
                methods,
                aggregations,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ShippingMethodRepository for FixedRepository {
        async fn search(
            &self,
            criteria: &SearchCriteria,
            _context: &SalesChannelContext,
        ) -> StoreApiResult<EntitySearchResult<ShippingMethodCollection>> {
            self.seen.lock().unwrap().push(criteria.clone());
            Ok(EntitySearchResult::new(
                self.methods.len() as u64,
                self.aggregations.clone(),
                criteria.page(),
                criteria.limit(),
                ShippingMethodCollection::new(self.methods.clone()),
            ))
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl ShippingMethodRepository for FailingRepository {
        async fn search(
            &self,
            _criteria: &SearchCriteria,
            _context: &SalesChannelContext,
        ) -> StoreApiResult<EntitySearchResult<ShippingMethodCollection>> {
            Err(StoreApiError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Five methods, two of which are available under the returned context.
    fn five_methods() -> (Vec<ShippingMethod>, SalesChannelContext) {
        let granted = Uuid::new_v4();
        let other = Uuid::new_v4();
        let methods = vec![
            ShippingMethod::new("Standard").with_availability_rule(granted),
            ShippingMethod::new("Express").with_availability_rule(other),
            ShippingMethod::new("Pickup").with_availability_rule(granted),
            ShippingMethod::new("Freight"),
            ShippingMethod::new("Courier").with_availability_rule(other),
        ];
        let context = SalesChannelContext::new(SalesChannel::new("Storefront"), vec![granted]);
        (methods, context)
    }

    fn only_available(value: &str) -> RequestParameters {
        RequestParameters::from_query([(ONLY_AVAILABLE, value)])
    }

    #[tokio::test]
    async fn test_criteria_gets_active_filter_and_media_association() {
        let (methods, context) = five_methods();
        let repository = Arc::new(FixedRepository::new(methods));
        let route = BaseShippingMethodRoute::new(repository.clone());

        let mut criteria = SearchCriteria::new();
        criteria
            .add_filter(Filter::equals("name", "Standard"))
            .add_association("media");

        route
            .load(&RequestParameters::default(), &context, &mut criteria)
            .await
            .unwrap();

        assert_eq!(
            criteria.filters(),
            &[
                Filter::equals("name", "Standard"),
                Filter::equals("active", true)
            ]
        );
        assert_eq!(criteria.associations().collect::<Vec<_>>(), vec!["media"]);

        let seen = repository.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], criteria);
    }

    #[tokio::test]
    async fn test_without_flag_returns_repository_result_unchanged() {
        let (methods, context) = five_methods();
        let repository = Arc::new(FixedRepository::new(methods.clone()));
        let route = BaseShippingMethodRoute::new(repository);

        let response = route
            .load(&only_available("false"), &context, &mut SearchCriteria::new())
            .await
            .unwrap();

        assert_eq!(response.shipping_methods().clone().into_inner(), methods);
        assert_eq!(response.result().total, 5);
    }

    #[tokio::test]
    async fn test_only_available_filters_but_keeps_total_and_aggregations() {
        let (methods, context) = five_methods();
        let route = BaseShippingMethodRoute::new(Arc::new(FixedRepository::new(methods)));

        let response = route
            .load(&only_available("1"), &context, &mut SearchCriteria::new())
            .await
            .unwrap();

        let names: Vec<_> = response
            .shipping_methods()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["Standard", "Pickup"]);
        assert_eq!(response.result().total, 5);
        assert_eq!(response.result().aggregations["methods"], json!({"count": 5}));
    }

    #[tokio::test]
    async fn test_only_available_true_string() {
        let (methods, context) = five_methods();
        let route = BaseShippingMethodRoute::new(Arc::new(FixedRepository::new(methods)));

        let response = route
            .load(&only_available("true"), &context, &mut SearchCriteria::new())
            .await
            .unwrap();

        assert_eq!(response.shipping_methods().len(), 2);
    }

    #[tokio::test]
    async fn test_repository_error_propagates_unchanged() {
        let (_, context) = five_methods();
        let route = BaseShippingMethodRoute::new(Arc::new(FailingRepository));

        let err = route
            .load(&only_available("1"), &context, &mut SearchCriteria::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreApiError::Database(sqlx::Error::PoolTimedOut)
        ));
    }

    #[test]
    fn test_base_route_decorates_nothing() {
        let route = BaseShippingMethodRoute::new(Arc::new(FailingRepository));

        let err = route
            .decorated()
            .err()
            .expect("base route must not decorate anything");
        assert!(matches!(
            err,
            StoreApiError::DecorationPattern(ref name) if name.contains("BaseShippingMethodRoute")
        ));
    }
}
