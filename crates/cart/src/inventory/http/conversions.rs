//! Wire types for the inventory REST API and their domain conversions.

use rust_decimal::Decimal;
use serde::Deserialize;

use rocketshoes_core::ProductId;

use crate::cart::{ProductMetadata, StockLevel};

/// `GET /products/{id}` response body.
#[derive(Debug, Deserialize)]
pub(super) struct ProductResponse {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
}

/// `GET /stock/{id}` response body.
#[derive(Debug, Deserialize)]
pub(super) struct StockResponse {
    pub id: ProductId,
    pub amount: i64,
}

pub(super) fn convert_product(response: ProductResponse) -> ProductMetadata {
    ProductMetadata {
        id: response.id,
        name: response.title,
        price: response.price,
        image_url: response.image,
    }
}

/// Negative stock is reported as zero available; values above `u32::MAX`
/// saturate.
pub(super) fn convert_stock(response: &StockResponse) -> StockLevel {
    let available = u32::try_from(response.amount.max(0)).unwrap_or(u32::MAX);
    StockLevel {
        product_id: response.id,
        available,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_product() {
        let response: ProductResponse = serde_json::from_str(
            r#"{"id":1,"title":"Tênis de Caminhada","price":179.9,"image":"https://cdn.example.test/1.jpg"}"#,
        )
        .unwrap();
        let product = convert_product(response);

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.name, "Tênis de Caminhada");
        assert_eq!(product.price, Decimal::new(1799, 1));
        assert_eq!(product.image_url, "https://cdn.example.test/1.jpg");
    }

    #[test]
    fn test_convert_product_without_image() {
        let response: ProductResponse =
            serde_json::from_str(r#"{"id":2,"title":"Sandal","price":"49.50"}"#).unwrap();
        assert_eq!(convert_product(response).image_url, "");
    }

    #[test]
    fn test_convert_stock_clamps() {
        let stock = convert_stock(&StockResponse {
            id: ProductId::new(3),
            amount: 5,
        });
        assert_eq!(stock.available, 5);

        let stock = convert_stock(&StockResponse {
            id: ProductId::new(3),
            amount: -4,
        });
        assert_eq!(stock.available, 0);

        let stock = convert_stock(&StockResponse {
            id: ProductId::new(3),
            amount: i64::MAX,
        });
        assert_eq!(stock.available, u32::MAX);
    }
}
