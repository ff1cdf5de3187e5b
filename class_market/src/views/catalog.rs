//! Class catalog and class detail.

use super::ViewContext;
use crate::{
    fetch::{Loadable, Resource},
    models::Course,
};

/// Approved classes, filterable by name.
pub struct CatalogView {
    ctx: ViewContext,
    classes: Resource<Vec<Course>>,
    query: String,
}

impl CatalogView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            classes: Resource::new(),
            query: String::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.classes.start(async move {
            let mut classes = ctx
                .call(ctx.api().approved_classes())
                .await
                .map_err(|e| e.client_message())?;
            ctx.images().resolve_cards(&mut classes).await;
            Ok::<_, String>(classes)
        });
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Loaded classes matching the current search.
    pub fn state(&self) -> Loadable<Vec<Course>> {
        let query = self.query.clone();
        self.classes.state().map(|classes| filter_by_name(classes, &query))
    }

    pub async fn settled(&self) -> Loadable<Vec<Course>> {
        self.classes.settled().await;
        self.state()
    }
}

/// Case-insensitive substring match on the class name; an empty query keeps everything.
pub fn filter_by_name(classes: Vec<Course>, query: &str) -> Vec<Course> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return classes;
    }
    classes
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&query))
        .collect()
}

/// One class, by id.
pub struct ClassDetailView {
    ctx: ViewContext,
    id: String,
    course: Resource<Course>,
}

impl ClassDetailView {
    pub fn new(ctx: ViewContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            course: Resource::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let id = self.id.clone();
        self.course.start(async move {
            let mut course = ctx.call(ctx.api().class(&id)).await.map_err(|e| e.client_message())?;
            ctx.images().resolve_cards(std::slice::from_mut(&mut course)).await;
            Ok::<_, String>(course)
        });
    }

    pub fn state(&self) -> Loadable<Course> {
        self.course.state()
    }

    pub async fn settled(&self) -> Loadable<Course> {
        self.course.settled().await
    }
}
