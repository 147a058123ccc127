use std::future::Future;

use serde_json::json;
use storefront_client::{ApiError, HttpProductApi, ProductApi};
use storefront_core::{filter_products, ProductDraft, ProductId};

use crate::commands::{current_thread_runtime, load_config, CommandResult, EXIT_API, EXIT_CONFIG};

pub fn list(filter: Option<&str>) -> CommandResult {
    let filter = filter.unwrap_or_default();
    with_api("products.list", |api| async move {
        let products = api.list().await?;
        let visible = filter_products(&products, filter);
        let message = if visible.is_empty() {
            "no products".to_string()
        } else {
            visible
                .iter()
                .map(|product| format!("- [{}] {} ${}", product.id, product.name, product.price))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok::<_, ApiError>((message, json!(visible)))
    })
}

pub fn add(name: &str, price: &str) -> CommandResult {
    let draft = ProductDraft::new(name.trim(), price.trim());
    with_api("products.add", |api| async move {
        let product = api.create(&draft).await?;
        let message = format!("added {} with id {}", product.name, product.id);
        Ok::<_, ApiError>((message, json!(product)))
    })
}

pub fn update(id: &str, name: &str, price: &str) -> CommandResult {
    let id = ProductId::from(id);
    let draft = ProductDraft::new(name.trim(), price.trim());
    with_api("products.update", |api| async move {
        let product = api.update(&id, &draft).await?;
        Ok::<_, ApiError>((format!("updated product {}", product.id), json!(product)))
    })
}

pub fn delete(id: &str) -> CommandResult {
    let id = ProductId::from(id);
    with_api("products.delete", |api| async move {
        api.delete(&id).await?;
        Ok::<_, ApiError>((format!("deleted product {id}"), json!({ "id": id })))
    })
}

fn with_api<F, Fut>(command: &str, call: F) -> CommandResult
where
    F: FnOnce(HttpProductApi) -> Fut,
    Fut: Future<Output = Result<(String, serde_json::Value), ApiError>>,
{
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let api = match HttpProductApi::new(&config.api) {
        Ok(api) => api,
        Err(error) => {
            return CommandResult::failure(command, error.class(), error.to_string(), EXIT_CONFIG)
        }
    };

    let runtime = match current_thread_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    match runtime.block_on(call(api)) {
        Ok((message, data)) => CommandResult::success_with_data(command, message, Some(data)),
        Err(error) => CommandResult::failure(command, error.class(), error.to_string(), EXIT_API),
    }
}
