use storefront_core::{AppState, CatalogStatus, NotificationLevel, Product};

/// Plain-text view of the store. Derived from `state` on every call.
pub fn render(state: &AppState) -> String {
    let mut lines = vec!["E-commerce Store".to_owned()];

    if let Some(notification) = state.notification.current() {
        lines.push(format!("{} {}", level_tag(notification.level), notification.message));
    }

    lines.push(String::new());
    lines.push(format!("Search Products: {}", state.filter));

    lines.push(String::new());
    lines.push("Add a New Product".to_owned());
    lines.push(format!("  Name:  {}", state.draft.name));
    lines.push(format!("  Price: {}", state.draft.price));
    match state.pending.len() {
        0 => {}
        1 => lines.push("  (1 submission pending)".to_owned()),
        pending => lines.push(format!("  ({pending} submissions pending)")),
    }

    lines.push(String::new());
    lines.push("Available Products".to_owned());
    let visible = state.visible_products();
    if visible.is_empty() {
        lines.push(format!("  {}", empty_catalog_hint(state)));
    }
    lines.extend(visible.into_iter().map(|product| format!("  {}", product_line(product))));

    lines.push(String::new());
    lines.push("Shopping Cart".to_owned());
    if state.cart.is_empty() {
        lines.push("  Your cart is empty.".to_owned());
    } else {
        lines.extend(state.cart.items().iter().map(|item| format!("  {}", product_line(item))));
        lines.push(format!("  Total: ${:.2}", state.cart.subtotal()));
    }

    lines.join("\n")
}

fn product_line(product: &Product) -> String {
    format!("{} - ${} [id {}]", product.name, product.price, product.id)
}

fn level_tag(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "[info]",
        NotificationLevel::Success => "[ok]",
        NotificationLevel::Warning => "[warn]",
        NotificationLevel::Error => "[error]",
    }
}

fn empty_catalog_hint(state: &AppState) -> &'static str {
    match state.catalog_status {
        CatalogStatus::NotLoaded | CatalogStatus::Loading => "Loading products...",
        CatalogStatus::Failed => "Products could not be loaded.",
        CatalogStatus::Loaded if state.catalog.is_empty() => "No products yet.",
        CatalogStatus::Loaded => "No products match the search.",
    }
}
