//! Home page and instructor list.

use super::{ViewContext, ViewResult};
use crate::{
    fetch::{Loadable, Resource},
    models::{Course, UserRecord},
};

/// Classes shown in the home page's popular section.
pub const POPULAR_LIMIT: usize = 6;

/// The `limit` most enrolled classes, ties broken by name.
pub fn popular(mut classes: Vec<Course>, limit: usize) -> Vec<Course> {
    classes.sort_by(|a, b| {
        b.total_enrolled
            .cmp(&a.total_enrolled)
            .then_with(|| a.name.cmp(&b.name))
    });
    classes.truncate(limit);
    classes
}

async fn load_popular(ctx: &ViewContext) -> ViewResult<Vec<Course>> {
    let classes = ctx.call(ctx.api().approved_classes()).await?;
    let mut shown = popular(classes, POPULAR_LIMIT);
    ctx.images().resolve_cards(&mut shown).await;
    Ok(shown)
}

pub struct HomeView {
    ctx: ViewContext,
    popular: Resource<Vec<Course>>,
    instructors: Resource<Vec<UserRecord>>,
}

impl HomeView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            popular: Resource::new(),
            instructors: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.popular
            .start(async move { load_popular(&ctx).await.map_err(|e| e.client_message()) });

        let ctx = self.ctx.clone();
        self.instructors.start(async move {
            ctx.call(ctx.api().instructors())
                .await
                .map(|all| all.into_iter().take(POPULAR_LIMIT).collect())
                .map_err(|e| e.client_message())
        });
    }

    pub fn popular(&self) -> Loadable<Vec<Course>> {
        self.popular.state()
    }

    pub fn instructors(&self) -> Loadable<Vec<UserRecord>> {
        self.instructors.state()
    }

    pub async fn settled(&self) -> (Loadable<Vec<Course>>, Loadable<Vec<UserRecord>>) {
        (self.popular.settled().await, self.instructors.settled().await)
    }
}

/// Every instructor.
pub struct InstructorsView {
    ctx: ViewContext,
    instructors: Resource<Vec<UserRecord>>,
}

impl InstructorsView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            instructors: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.instructors.start(async move {
            ctx.call(ctx.api().instructors())
                .await
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<UserRecord>> {
        self.instructors.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<UserRecord>> {
        self.instructors.settled().await
    }
}
