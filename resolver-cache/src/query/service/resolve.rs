use {
    super::{
        project::project,
        FetchResult,
        Service,
    },
    crate::{
        kernel::{
            entities::{
                Arguments,
                EntityKey,
                Value,
            },
            error::CacheError,
            upstream::Fetcher,
        },
        query::entities::{
            QueryTarget,
            ResolvableQuery,
        },
        store::NamespaceStore,
    },
    axum_prometheus::metrics,
    serde_json::Map,
    std::sync::Arc,
    time::OffsetDateTime,
};

pub struct ResolveInput {
    pub query:   ResolvableQuery,
    pub fetcher: Arc<dyn Fetcher>,
}

fn query_target(
    query: &ResolvableQuery,
    namespace: &NamespaceStore,
) -> Result<QueryTarget, CacheError> {
    let argument = &namespace.config.key_argument;
    let invalid = |reason: &str| CacheError::InvalidArgument {
        query_name: query.query_name.clone(),
        argument:   argument.clone(),
        reason:     reason.to_string(),
    };
    let key = |value: &Value| match value {
        Value::String(key) => Ok(key.clone()),
        Value::Number(key) => Ok(key.to_string()),
        _ => Err(invalid("keys must be strings or numbers")),
    };

    match query.arguments.get(argument) {
        None | Some(Value::Null) => Err(CacheError::MissingArgument {
            query_name: query.query_name.clone(),
            argument:   argument.clone(),
        }),
        Some(Value::Array(values)) => Ok(QueryTarget::Many(
            values.iter().map(key).collect::<Result<_, _>>()?,
        )),
        Some(value) => Ok(QueryTarget::Single(key(value)?)),
    }
}

impl Service {
    /// Resolves a query against the cache, fetching missing or stale entities through the
    /// given fetcher. Concurrent fetches of the same entity with the same arguments run once.
    #[tracing::instrument(skip_all, fields(query_name = %input.query.query_name))]
    pub async fn resolve(&self, input: ResolveInput) -> Result<Value, CacheError> {
        let ResolveInput { query, fetcher } = input;
        let namespace = self.store.namespace(&query.query_name)?;
        let projection = match query_target(&query, namespace)? {
            QueryTarget::Single(key) => {
                let record = self
                    .load_entity(namespace, key, &query.arguments, fetcher)
                    .await?;
                project(&record.value, &query.requested_fields)
            }
            QueryTarget::Many(keys) => {
                let records = futures::future::try_join_all(keys.into_iter().map(|key| {
                    self.load_entity(namespace, key, &query.arguments, fetcher.clone())
                }))
                .await?;
                Value::Array(
                    records
                        .iter()
                        .map(|record| project(&record.value, &query.requested_fields))
                        .collect(),
                )
            }
        };

        let mut result = Map::new();
        result.insert(query.result_key().to_string(), projection);
        Ok(Value::Object(result))
    }

    async fn load_entity(
        &self,
        namespace: &NamespaceStore,
        key: EntityKey,
        arguments: &Arguments,
        fetcher: Arc<dyn Fetcher>,
    ) -> FetchResult {
        // Read before the record so any write or eviction after this point wins over the fetch.
        let observed_version = self.store.entity_version(namespace.name(), &key)?;
        let cached = self.store.get_entity_record(namespace.name(), &key)?;
        let lookup = match &cached {
            Some(record) if record.is_fresh(namespace.config.ttl, OffsetDateTime::now_utc()) => {
                "hit"
            }
            Some(_) => "stale",
            None => "miss",
        };
        metrics::counter!(
            "entity_cache_lookups_total",
            &[
                ("namespace", namespace.name().to_string()),
                ("result", lookup.to_string()),
            ]
        )
        .increment(1);
        match cached {
            Some(record) if lookup == "hit" => return Ok(record),
            _ => {}
        }

        // Each key is fetched with only its own key argument, so overlapping multi-key
        // queries share the fetches of their common keys.
        let mut arguments = arguments.clone();
        arguments.insert(
            namespace.config.key_argument.clone(),
            Value::String(key.clone()),
        );
        let namespace_name = namespace.name().to_string();
        let store = self.store.clone();
        self.coalescer
            .execute(
                (namespace_name.clone(), key.clone(), arguments),
                move |(namespace, key, arguments)| async move {
                    tracing::debug!(%namespace, %key, "Fetching entity");
                    let value = fetcher
                        .fetch(&namespace, &key, &arguments)
                        .await
                        .map_err(|err| {
                            tracing::warn!(%namespace, %key, error = ?err, "Entity fetch failed");
                            CacheError::fetch_failed(&namespace, &key, err)
                        })?;
                    store
                        .refresh_entity_record(&namespace, key, value, observed_version)
                        .await
                },
            )
            .await
            .unwrap_or_else(|err| {
                tracing::error!(
                    namespace = %namespace_name,
                    %key,
                    error = %err,
                    "Entity fetch aborted"
                );
                Err(CacheError::fetch_failed(
                    &namespace_name,
                    &key,
                    anyhow::Error::new(err),
                ))
            })
    }
}
