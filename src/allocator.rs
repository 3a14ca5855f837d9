use crate::config::IdStrategy;
use crate::error::ApiResult;
use crate::store::CatalogStore;

const PRODUCT_SEQUENCE: &str = "product_id";

/// Id following the most recently inserted product, or `base` for an empty
/// catalog. This follows insertion order, not the numeric maximum: after a
/// deletion or an out-of-order insert the result can collide with an
/// existing id.
pub fn next_id<I>(ids_in_insertion_order: I, base: i64) -> i64
where
    I: IntoIterator<Item = i64>,
{
    ids_in_insertion_order
        .into_iter()
        .last()
        .map_or(base, |last| last + 1)
}

#[derive(Debug, Clone, Copy)]
pub struct IdAllocator {
    base: i64,
    strategy: IdStrategy,
}

impl IdAllocator {
    pub fn new(base: i64, strategy: IdStrategy) -> Self {
        IdAllocator { base, strategy }
    }

    pub async fn allocate(&self, store: &dyn CatalogStore) -> ApiResult<i64> {
        match self.strategy {
            IdStrategy::LastInserted => {
                let products = store.all_products().await?;
                Ok(next_id(products.iter().map(|p| p.id), self.base))
            }
            IdStrategy::Counter => {
                let seq = store.next_sequence(PRODUCT_SEQUENCE).await?;
                Ok(self.base - 1 + seq)
            }
        }
    }
}
