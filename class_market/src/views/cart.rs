//! Selected classes (the cart) and adding to it.

use super::{Confirm, ViewContext, ViewError, ViewResult, require_role};
use crate::{
    fetch::{Loadable, Resource},
    models::{AppProfile, CartEntry, Course, NewCartItem, Role, cart_total},
    net::{ApiError, WriteAck},
};
use log::{debug, info};

/// Put `course` in the viewer's cart.
///
/// Checked in order: signed in, student, seats left, not enrolled yet, not
/// already in the cart. Only then is the item inserted.
pub async fn add_to_cart(ctx: &ViewContext, viewer: Option<&AppProfile>, course: &Course) -> ViewResult<WriteAck> {
    let viewer = viewer.ok_or(ViewError::NotSignedIn)?;
    require_role(viewer, Role::User, "Only students can select classes")?;
    if course.is_sold_out() {
        return Err(ViewError::SoldOut);
    }

    let enrolled = ctx.call(ctx.api().enrolled_classes(&viewer.email)).await?;
    if enrolled.iter().any(|c| c.id == course.id) {
        return Err(ViewError::AlreadyEnrolled);
    }

    let cart = ctx.call(ctx.api().cart(&viewer.email)).await?;
    if cart.iter().any(|item| item.class_id == course.id) {
        debug!("{} already in cart of {}", course.id, viewer.email);
        return Err(ViewError::AlreadyInCart);
    }

    let ack = ctx
        .call(ctx.api().add_to_cart(&NewCartItem::new(&course.id, &viewer.email)))
        .await?;
    info!("Added {} to cart of {}", course.id, viewer.email);
    Ok(ack)
}

/// Cart items joined with their classes. A class that no longer exists
/// leaves the entry without a course.
pub async fn load_cart(ctx: &ViewContext, email: &str) -> ViewResult<Vec<CartEntry>> {
    let items = ctx.call(ctx.api().cart(email)).await?;
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let course = match ctx.call(ctx.api().class(&item.class_id)).await {
            Ok(course) => Some(course),
            Err(ViewError::Api(ApiError::NotFound(_))) => None,
            Err(e) => return Err(e),
        };
        entries.push(CartEntry { item, course });
    }
    Ok(entries)
}

pub struct CartView {
    ctx: ViewContext,
    email: String,
    entries: Resource<Vec<CartEntry>>,
}

impl CartView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            email: viewer.email.clone(),
            entries: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.email.clone();
        self.entries
            .start(async move { load_cart(&ctx, &email).await.map_err(|e| e.client_message()) });
    }

    pub fn state(&self) -> Loadable<Vec<CartEntry>> {
        self.entries.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<CartEntry>> {
        self.entries.settled().await
    }

    /// Total of the loaded entries; zero until loaded.
    pub fn total(&self) -> f64 {
        self.entries.state().loaded().map_or(0.0, |e| cart_total(e))
    }

    /// Checkout needs at least one loaded entry.
    pub fn can_checkout(&self) -> bool {
        self.entries.state().loaded().is_some_and(|e| !e.is_empty())
    }

    /// Remove a cart item after confirmation, then refetch.
    pub async fn remove(&mut self, cart_item_id: &str, confirm: &dyn Confirm) -> ViewResult<()> {
        let title = self
            .entries
            .state()
            .loaded()
            .and_then(|entries| entries.iter().find(|e| e.item.id == cart_item_id))
            .map(|e| e.title().to_string())
            .unwrap_or_else(|| "this class".to_string());

        if !confirm.confirm(&format!("Remove {title} from your cart?")) {
            return Err(ViewError::Cancelled);
        }

        self.ctx
            .call(self.ctx.api().remove_cart_item(cart_item_id))
            .await?;
        info!("Removed cart item {}", cart_item_id);
        self.refresh();
        Ok(())
    }
}
