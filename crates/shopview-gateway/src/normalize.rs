//! Mapping of backend response types into core catalog types.

use shopview_core::{Brand, CategoryPayload, FlatCategory, NestedCategory, Product};

use crate::types::{WireBrand, WireCategory, WireProduct};

/// Chooses the payload shape from the top level: a list whose entries name
/// a parent is a flat listing (any `children` arrays are ignored), anything
/// else is a nested forest of roots.
#[must_use]
pub fn category_payload(categories: Vec<WireCategory>) -> CategoryPayload {
    if categories.iter().any(|c| c.parent.is_some()) {
        CategoryPayload::Flat(
            categories
                .into_iter()
                .map(|c| FlatCategory {
                    id: c.category_id,
                    name: c.category_name,
                    parent_id: c.parent,
                })
                .collect(),
        )
    } else {
        CategoryPayload::Nested(categories.into_iter().map(nest).collect())
    }
}

fn nest(category: WireCategory) -> NestedCategory {
    NestedCategory {
        id: category.category_id,
        name: category.category_name,
        children: category.children.into_iter().map(nest).collect(),
    }
}

#[must_use]
pub fn normalize_brand(brand: WireBrand) -> Brand {
    Brand {
        id: brand.brand_id,
        name: brand.brand_name,
    }
}

/// Converts a backend product. The category id falls back to the embedded
/// category summary when the flat field is missing.
#[must_use]
pub fn normalize_product(product: WireProduct) -> Product {
    Product {
        id: product.productid,
        name: product.product_name,
        price: product.price,
        sale_price: product.sale_price,
        rating: product.avg_rating,
        review_count: product.reviews_count.unwrap_or(0),
        brand_id: product.brand_id,
        brand_name: product.brand_name,
        category_id: product
            .category_id
            .or(product.category.map(|c| c.category_id)),
    }
}
