use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::geo::Radius;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// `(page, per_page, offset)` with page >= 1 and per_page in 1..=100.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[serde(alias = "price-asc")]
    PriceAsc,
    #[serde(alias = "price-desc")]
    PriceDesc,
    Newest,
}

// Query structs keep pagination fields inline: serde's flatten does not
// work with numeric fields in url-encoded queries.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilterQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: Option<ProductSort>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Radius in kilometres around `lat`/`lng`.
    pub distance: Option<f64>,
}

impl ProductFilterQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Present only when origin and a positive radius were all given.
    pub fn radius(&self) -> Option<Radius> {
        match (self.lat, self.lng, self.distance) {
            (Some(lat), Some(lng), Some(km)) if km > 0.0 && lat.is_finite() && lng.is_finite() => {
                Some(Radius { lat, lng, km })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminProductQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AutocompleteQuery {
    pub input: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlaceDetailsQuery {
    pub place_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
        let p = Pagination {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(p.normalize(), (3, 20, 40));
    }

    #[test]
    fn huge_page_saturates_the_offset() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(p.normalize(), (i64::MAX, 100, i64::MAX));
    }

    #[test]
    fn radius_needs_origin_and_positive_distance() {
        let mut q = ProductFilterQuery {
            lat: Some(12.97),
            lng: Some(77.59),
            distance: Some(5.0),
            ..Default::default()
        };
        assert!(q.radius().is_some());
        q.distance = Some(0.0);
        assert!(q.radius().is_none());
        q.distance = Some(5.0);
        q.lng = None;
        assert!(q.radius().is_none());
    }

    #[test]
    fn sort_accepts_dashed_spelling() {
        let sort: ProductSort = serde_json::from_str("\"price-desc\"").expect("sort");
        assert!(matches!(sort, ProductSort::PriceDesc));
    }
}
