//! Client state shared by the line and TUI front ends.
//!
//! [`App`] owns the session, the navigator and the view mounted for the
//! current route. Front ends feed it parsed [`Command`]s, show the returned
//! [`Notice`]s and draw [`App::screen`].

use crate::{commands::Command, files, render};
use anyhow::{Context, Result};
use class_market::{
    AppProfile, ClientConfig, FileStore, Identity, IdentityProvider, LocalStore, MarketApi, PaymentGateway,
    ProfileResolver, PublicClient, RestIdentityProvider, Route, SessionStore, StripeGateway,
    models::CourseForm,
    net::AuthedClient,
    payment::CardDetails,
    progress::ProgressStore,
    routing::{GuardState, Navigation, Navigator},
    upload::{ImageHost, ImgbbHost},
    views::{
        Decided, ViewContext, ViewError,
        admin::{ApplicationsView, ManageClassesView, ManageUsersView},
        auth_forms::{self, LoginForm, RegisterForm},
        cart::{CartView, add_to_cart},
        catalog::{CatalogView, ClassDetailView},
        checkout::CheckoutView,
        home::{HomeView, InstructorsView},
        instructor::{MyClassesView, add_class, update_class},
        profile::{ProfileForm, update_profile},
        student::{ApplicationForm, CoursePlayer, EnrolledView, PaymentHistoryView, apply_instructor},
    },
};
use log::{debug, info};
use std::sync::Arc;

pub const HELP: &str = "\
home | classes | instructors | dashboard | cart | checkout
        Jump to a page. 'go <path>' opens any path, e.g. 'go /dashboard/profile'.
class <id>
        Show a class.
search <text>
        Filter the class list by name.
refresh
        Fetch the current page again.
login <email> <password>
        Sign in.
register <email> <password> <name>
        Create a student account.
google <id token>
        Sign in with a Google ID token.
logout
        Sign out.
whoami
        Show your profile.
select <class id>
        Put a class in your cart.
remove <cart item id>
        Remove an item from your cart (asks first).
pay <card number> <MM/YY> <cvc>
        Pay for everything in your cart.
learn <class id>
        Open an enrolled class.
done <module> <lesson>
        Toggle a lesson of the open class as complete.
apply <title> | <experience>
        Apply to teach.
publish <class.json>
        Submit a new class for review (instructors).
edit <class id> <class.json>
        Change one of your classes (instructors).
delete <class id>
        Delete one of your classes (asks first).
approve <class id> | reject <class id> [feedback]
        Moderate a pending class (admins).
make-admin <user id> | make-instructor <user id>
        Change a user's role (admins).
accept <application id> | decline <application id>
        Decide on an instructor application (admins).
profile <name> [| <photo file>]
        Change your display name and photo.
yes | no
        Answer a confirmation prompt.
help
        Show this text.
quit
        Exit.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
    Alert,
}

/// A message for the user about something that just happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { tone: Tone::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { tone: Tone::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { tone: Tone::Error, text: text.into() }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self { tone: Tone::Alert, text: text.into() }
    }
}

/// What to draw for the current route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub title: String,
    pub lines: Vec<String>,
}

/// External collaborators, built from configuration or supplied by tests.
pub struct Services {
    pub provider: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn LocalStore>,
    pub public: PublicClient,
    pub gateway: Arc<dyn PaymentGateway>,
    pub images: Arc<dyn ImageHost>,
}

impl Services {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let store = FileStore::open(config.store_path())
            .with_context(|| format!("Failed to open {}", config.store_path().display()))?;
        let public = PublicClient::new(&config.api_base_url, config.request_timeout)
            .context("Failed to build the backend client")?;
        let provider = RestIdentityProvider::with_endpoints(
            config.identity.api_key.clone(),
            config.identity.base_url.clone(),
            config.identity.secure_token_url.clone(),
        );
        Ok(Self {
            provider: Arc::new(provider),
            store: Arc::new(store),
            public,
            gateway: Arc::new(StripeGateway::new(config.stripe_publishable_key.clone())),
            images: Arc::new(ImgbbHost::new(config.image_host_key.clone())),
        })
    }
}

/// A destructive action waiting for yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    RemoveCartItem(String),
    DeleteClass(String),
}

/// The view mounted for the current route.
enum Page {
    /// Guard is waiting on the session.
    Waiting(Route),
    Home(HomeView),
    Classes(CatalogView),
    ClassDetail(ClassDetailView),
    Instructors(InstructorsView),
    /// Routes whose content is a form filled in through commands.
    Form(Route),
    Cart(CartView),
    Enrolled(EnrolledView),
    Payments(PaymentHistoryView),
    Checkout(CheckoutView),
    Player(CoursePlayer),
    MyClasses(MyClassesView),
    UpdateClass(ClassDetailView),
    ManageClasses(ManageClassesView),
    ManageUsers(ManageUsersView),
    Applications(ApplicationsView),
    NotFound(String),
}

impl Page {
    fn refresh(&mut self) {
        match self {
            Page::Home(view) => view.refresh(),
            Page::Classes(view) => view.refresh(),
            Page::ClassDetail(view) | Page::UpdateClass(view) => view.refresh(),
            Page::Instructors(view) => view.refresh(),
            Page::Cart(view) => view.refresh(),
            Page::Enrolled(view) => view.refresh(),
            Page::Payments(view) => view.refresh(),
            Page::Checkout(view) => view.refresh(),
            Page::Player(view) => view.refresh(),
            Page::MyClasses(view) => view.refresh(),
            Page::ManageClasses(view) => view.refresh(),
            Page::ManageUsers(view) => view.refresh(),
            Page::Applications(view) => view.refresh(),
            Page::Waiting(_) | Page::Form(_) | Page::NotFound(_) => {}
        }
    }

    /// Wait for the page's fetches to finish.
    async fn settled(&self) {
        match self {
            Page::Home(view) => {
                view.settled().await;
            }
            Page::Classes(view) => {
                view.settled().await;
            }
            Page::ClassDetail(view) | Page::UpdateClass(view) => {
                view.settled().await;
            }
            Page::Instructors(view) => {
                view.settled().await;
            }
            Page::Cart(view) => {
                view.settled().await;
            }
            Page::Enrolled(view) => {
                view.settled().await;
            }
            Page::Payments(view) => {
                view.settled().await;
            }
            Page::Checkout(view) => {
                view.settled().await;
            }
            Page::Player(view) => {
                view.settled().await;
            }
            Page::MyClasses(view) => {
                view.settled().await;
            }
            Page::ManageClasses(view) => {
                view.settled().await;
            }
            Page::ManageUsers(view) => {
                view.settled().await;
            }
            Page::Applications(view) => {
                view.settled().await;
            }
            Page::Waiting(_) | Page::Form(_) | Page::NotFound(_) => {}
        }
    }

    fn lines(&self, profile: Option<&AppProfile>) -> Vec<String> {
        match self {
            Page::Waiting(_) => vec!["Loading...".to_string()],
            Page::Home(view) => {
                let mut lines = vec!["Popular classes".to_string()];
                lines.extend(render::loadable(&view.popular(), |c| {
                    render::course_list(c, "No classes yet")
                }));
                lines.push(String::new());
                lines.push("Instructors".to_string());
                lines.extend(render::loadable(&view.instructors(), |u| {
                    render::users(u, "No instructors yet")
                }));
                lines
            }
            Page::Classes(view) => {
                let mut lines = Vec::new();
                if !view.query().is_empty() {
                    lines.push(format!("Search: {}", view.query()));
                }
                lines.extend(render::loadable(&view.state(), |c| {
                    render::course_list(c, "No classes match")
                }));
                lines
            }
            Page::ClassDetail(view) => {
                let mut lines = render::loadable(&view.state(), |c| render::course_detail(c));
                lines.push(String::new());
                lines.push(format!("select {} to add it to your cart", view.id()));
                lines
            }
            Page::UpdateClass(view) => {
                let mut lines = render::loadable(&view.state(), |c| render::course_detail(c));
                lines.push(String::new());
                lines.push(format!("edit {} <class.json> to change it", view.id()));
                lines
            }
            Page::Instructors(view) => render::loadable(&view.state(), |u| render::users(u, "No instructors yet")),
            Page::Form(route) => form_lines(route, profile),
            Page::Cart(view) => {
                let mut lines = render::loadable(&view.state(), |e| render::cart(e));
                if view.can_checkout() {
                    lines.push("checkout to pay".to_string());
                }
                lines
            }
            Page::Enrolled(view) => render::loadable(&view.state(), |c| {
                render::course_list(c, "You are not enrolled in any class")
            }),
            Page::Payments(view) => render::loadable(&view.state(), |p| render::payments(p)),
            Page::Checkout(view) => {
                let mut lines = render::loadable(&view.state(), |e| render::cart(e));
                if view.can_checkout() {
                    lines.push("pay <card number> <MM/YY> <cvc>".to_string());
                }
                lines
            }
            Page::Player(view) => render::loadable(&view.state(), |c| {
                render::player(c, &view.completed(), view.percent())
            }),
            Page::MyClasses(view) => render::loadable(&view.state(), |c| {
                render::course_list(c, "No classes yet, publish one")
            }),
            Page::ManageClasses(view) => render::loadable(&view.state(), |c| render::course_list(c, "No classes")),
            Page::ManageUsers(view) => render::loadable(&view.state(), |u| render::users(u, "No users")),
            Page::Applications(view) => render::loadable(&view.state(), |a| render::applications(a)),
            Page::NotFound(path) => vec![format!("Nothing at {path}")],
        }
    }
}

fn form_lines(route: &Route, profile: Option<&AppProfile>) -> Vec<String> {
    match route {
        Route::Login => vec![
            "login <email> <password>".to_string(),
            "google <id token>".to_string(),
            "New here? register <email> <password> <name>".to_string(),
        ],
        Route::Register => vec![
            "register <email> <password> <name>".to_string(),
            "Passwords need 6+ characters with an uppercase letter and a special character".to_string(),
        ],
        Route::AddClass => vec![
            "publish <class.json>".to_string(),
            "The file holds name, price, availableSeats, image (path) and modules".to_string(),
        ],
        Route::ApplyInstructor => vec!["apply <title> | <experience>".to_string()],
        Route::Profile => {
            let mut lines = profile.map(render::profile).unwrap_or_default();
            lines.push(String::new());
            lines.push("profile <name> [| <photo file>]".to_string());
            lines
        }
        other => vec![other.path()],
    }
}

fn title(route: &Route) -> &'static str {
    match route {
        Route::Home => "Home",
        Route::Classes => "Classes",
        Route::ClassDetail(_) => "Class",
        Route::Instructors => "Instructors",
        Route::Login => "Sign in",
        Route::Register => "Register",
        Route::Dashboard => "Dashboard",
        Route::Profile => "Profile",
        Route::SelectedClasses => "My cart",
        Route::EnrolledClasses => "Enrolled classes",
        Route::PaymentHistory => "Payment history",
        Route::Checkout => "Checkout",
        Route::CoursePlayer(_) => "Course",
        Route::ApplyInstructor => "Teach with us",
        Route::AddClass => "Add a class",
        Route::MyClasses => "My classes",
        Route::ApprovedClasses => "Approved classes",
        Route::UpdateClass(_) => "Update class",
        Route::ManageClasses => "Manage classes",
        Route::ManageUsers => "Manage users",
        Route::Applications => "Instructor applications",
        Route::NotFound(_) => "Not found",
    }
}

type Outcome = std::result::Result<Vec<Notice>, String>;

fn failed(e: ViewError) -> String {
    e.client_message()
}

pub struct App {
    ctx: ViewContext,
    resolver: ProfileResolver,
    gateway: Arc<dyn PaymentGateway>,
    images: Arc<dyn ImageHost>,
    progress: Arc<ProgressStore>,
    navigator: Navigator,
    profile: Option<AppProfile>,
    page: Page,
    pending: Option<Pending>,
    started: bool,
    quit: bool,
}

impl App {
    pub fn new(services: Services) -> Self {
        let api = MarketApi::new(AuthedClient::new(services.public, services.store.clone()));
        let session = Arc::new(SessionStore::new(services.provider, api, services.store.clone()));
        Self {
            ctx: ViewContext::new(session.clone()),
            resolver: ProfileResolver::new(session),
            gateway: services.gateway,
            images: services.images,
            progress: Arc::new(ProgressStore::new(services.store)),
            navigator: Navigator::new(),
            profile: None,
            page: Page::Waiting(Route::Home),
            pending: None,
            started: false,
            quit: false,
        }
    }

    /// Restore the saved session and show the first page. Runs once.
    pub async fn start(&mut self) -> Vec<Notice> {
        if std::mem::replace(&mut self.started, true) {
            return Vec::new();
        }
        let restored = self.ctx.session().init().await;
        let mut notices = Vec::new();
        match restored {
            Some(identity) => {
                let profile = self.resolver.resolve(&identity).await;
                notices.push(Notice::info(format!("Signed in as {} ({})", profile.email, profile.role)));
                self.profile = Some(profile);
            }
            None => notices.push(Notice::info("Not signed in. Type 'login <email> <password>' or 'help'")),
        }
        let navigation = self.navigator.settle(&self.guard_state());
        self.arrive(&navigation);
        self.sync_session(&mut notices);
        notices
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn profile(&self) -> Option<&AppProfile> {
        self.profile.as_ref()
    }

    pub fn route(&self) -> &Route {
        self.navigator.current()
    }

    /// Whether a yes/no answer is expected.
    pub fn awaiting_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    pub async fn handle(&mut self, command: Command) -> Vec<Notice> {
        debug!("Handling {:?}", command);
        let mut notices = self.dispatch(command).await.unwrap_or_else(|message| vec![Notice::error(message)]);
        self.sync_session(&mut notices);
        notices
    }

    /// Wait until the current page has its data.
    pub async fn settle_page(&self) {
        self.page.settled().await;
    }

    /// Notices for session changes that happened in the background, such as
    /// a fetch that hit an authorization failure.
    pub fn poll_session(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        self.sync_session(&mut notices);
        notices
    }

    pub fn screen(&self) -> Screen {
        let route = self.navigator.current();
        let title = match &self.page {
            Page::Waiting(pending) => format!("{} (waiting for session)", title(pending)),
            _ => title(route).to_string(),
        };
        Screen {
            title,
            lines: self.page.lines(self.profile.as_ref()),
        }
    }

    fn guard_state(&self) -> GuardState {
        let session = self.ctx.session();
        GuardState::derive(session.is_ready(), session.current().as_ref(), self.profile.as_ref())
    }

    /// The session ended without a logout: drop the profile and re-run the guard.
    fn sync_session(&mut self, notices: &mut Vec<Notice>) {
        if self.profile.is_some() && self.ctx.session().current().is_none() {
            info!("Session ended, returning to sign-in");
            self.profile = None;
            self.pending = None;
            notices.push(Notice::alert("Your session expired, sign in again"));
            let navigation = self.navigator.settle(&self.guard_state());
            self.arrive(&navigation);
        }
    }

    fn go(&mut self, route: Route) -> Navigation {
        let navigation = self.navigator.navigate(route, &self.guard_state());
        self.arrive(&navigation);
        navigation
    }

    fn arrive(&mut self, navigation: &Navigation) {
        self.pending = None;
        self.page = match navigation {
            Navigation::Pending(route) => Page::Waiting(route.clone()),
            Navigation::Arrived(route) => {
                let mut page = self.mount(route);
                page.refresh();
                page
            }
        };
    }

    fn mount(&self, route: &Route) -> Page {
        let ctx = self.ctx.clone();
        match route {
            Route::Home => return Page::Home(HomeView::new(ctx)),
            Route::Classes => return Page::Classes(CatalogView::new(ctx)),
            Route::ClassDetail(id) => return Page::ClassDetail(ClassDetailView::new(ctx, id.clone())),
            Route::Instructors => return Page::Instructors(InstructorsView::new(ctx)),
            Route::Login | Route::Register => return Page::Form(route.clone()),
            Route::NotFound(path) => return Page::NotFound(path.clone()),
            _ => {}
        }

        let Some(viewer) = self.profile.as_ref() else {
            return Page::Waiting(route.clone());
        };
        match route {
            Route::Profile | Route::ApplyInstructor | Route::AddClass => Page::Form(route.clone()),
            Route::SelectedClasses => Page::Cart(CartView::new(ctx, viewer)),
            Route::EnrolledClasses => Page::Enrolled(EnrolledView::new(ctx, viewer)),
            Route::PaymentHistory => Page::Payments(PaymentHistoryView::new(ctx, viewer)),
            Route::Checkout => Page::Checkout(CheckoutView::new(ctx, self.gateway.clone(), viewer)),
            Route::CoursePlayer(id) => {
                Page::Player(CoursePlayer::new(ctx, viewer, id.clone(), self.progress.clone()))
            }
            Route::MyClasses => Page::MyClasses(MyClassesView::new(ctx, viewer)),
            Route::ApprovedClasses => Page::MyClasses(MyClassesView::approved(ctx, viewer)),
            Route::UpdateClass(id) => Page::UpdateClass(ClassDetailView::new(ctx, id.clone())),
            Route::ManageClasses => Page::ManageClasses(ManageClassesView::new(ctx, viewer)),
            Route::ManageUsers => Page::ManageUsers(ManageUsersView::new(ctx, viewer)),
            Route::Applications => Page::Applications(ApplicationsView::new(ctx, viewer)),
            // Dispatch never lands on the bare dashboard.
            other => Page::NotFound(other.path()),
        }
    }

    /// Navigate to `route` unless already there.
    fn ensure(&mut self, route: Route) {
        if self.navigator.current() != &route || matches!(self.page, Page::Waiting(_)) {
            self.go(route);
        }
    }

    fn viewer(&self) -> std::result::Result<AppProfile, String> {
        self.profile.clone().ok_or_else(|| ViewError::NotSignedIn.to_string())
    }

    fn moved(&self, requested: &Route, navigation: &Navigation) -> Vec<Notice> {
        match navigation {
            Navigation::Pending(_) => vec![Notice::info("Waiting for the session to load")],
            Navigation::Arrived(route) if route == &Route::Login && requested != &Route::Login => {
                vec![Notice::alert(format!("Sign in to open {requested}"))]
            }
            Navigation::Arrived(route) if route != requested && requested != &Route::Dashboard => {
                vec![Notice::info(format!("{requested} is not available, showing {route}"))]
            }
            Navigation::Arrived(_) => Vec::new(),
        }
    }

    async fn signed_in(&mut self, identity: Identity) -> Vec<Notice> {
        let profile = self.resolver.resolve(&identity).await;
        let welcome = Notice::success(format!("Welcome, {} ({})", profile.name, profile.role));
        self.profile = Some(profile);
        let navigation = self.navigator.after_login(&self.guard_state());
        self.arrive(&navigation);
        vec![welcome]
    }

    async fn dispatch(&mut self, command: Command) -> Outcome {
        match command {
            Command::Help => Ok(vec![Notice::info(HELP)]),
            Command::Quit => {
                self.quit = true;
                Ok(Vec::new())
            }
            Command::Go(route) => {
                let navigation = self.go(route.clone());
                Ok(self.moved(&route, &navigation))
            }
            Command::Refresh => {
                self.page.refresh();
                Ok(Vec::new())
            }
            Command::Search(query) => {
                self.ensure(Route::Classes);
                if let Page::Classes(view) = &mut self.page {
                    view.search(&query);
                }
                Ok(Vec::new())
            }
            Command::WhoAmI => Ok(match &self.profile {
                Some(profile) => render::profile(profile).into_iter().map(Notice::info).collect(),
                None => vec![Notice::info("Not signed in")],
            }),

            Command::Login { email, password } => {
                let identity = auth_forms::login(&self.ctx, &LoginForm { email, password })
                    .await
                    .map_err(failed)?;
                Ok(self.signed_in(identity).await)
            }
            Command::Register { email, password, name } => {
                let form = RegisterForm {
                    name,
                    email,
                    confirm_password: password.clone(),
                    password,
                    photo_url: None,
                };
                let identity = auth_forms::register(&self.ctx, &form).await.map_err(failed)?;
                Ok(self.signed_in(identity).await)
            }
            Command::Google(token) => {
                let identity = auth_forms::google_login(&self.ctx, &token).await.map_err(failed)?;
                Ok(self.signed_in(identity).await)
            }
            Command::Logout => {
                self.ctx.session().logout().await;
                self.profile = None;
                let navigation = self.navigator.settle(&self.guard_state());
                self.arrive(&navigation);
                Ok(vec![Notice::success("Signed out")])
            }

            Command::Select(class_id) => self.select(&class_id).await,
            Command::Remove(item_id) => {
                self.viewer()?;
                self.ensure(Route::SelectedClasses);
                if !matches!(self.page, Page::Cart(_)) {
                    return Err("Only students have a cart".to_string());
                }
                self.pending = Some(Pending::RemoveCartItem(item_id));
                Ok(vec![Notice::alert("Remove this class from your cart? (yes/no)")])
            }
            Command::Pay {
                number,
                exp_month,
                exp_year,
                cvc,
            } => self.pay(CardDetails::new(&number, exp_month, exp_year, &cvc)).await,
            Command::Done(at) => {
                let Page::Player(player) = &self.page else {
                    return Err("Open a class first with 'learn <class id>'".to_string());
                };
                let done = player.toggle_complete(at).map_err(failed)?;
                let state = if done { "complete" } else { "not complete" };
                Ok(vec![Notice::success(format!(
                    "Lesson {}.{} marked {state} ({}% done)",
                    at.0 + 1,
                    at.1 + 1,
                    player.percent()
                ))])
            }
            Command::Apply { title, experience } => {
                let viewer = self.viewer()?;
                apply_instructor(&self.ctx, &viewer, &ApplicationForm { title, experience })
                    .await
                    .map_err(failed)?;
                Ok(vec![Notice::success("Application sent, an admin will review it")])
            }

            Command::Publish(path) => {
                let viewer = self.viewer()?;
                let (form, image) = files::load_class_file(&path, CourseForm::default())
                    .await
                    .map_err(|e| format!("{e:#}"))?;
                let ack = add_class(&self.ctx, self.images.as_ref(), &viewer, &form, image.as_ref())
                    .await
                    .map_err(failed)?;
                self.go(Route::MyClasses);
                let id = ack.inserted_id.unwrap_or_default();
                Ok(vec![Notice::success(format!("'{}' submitted for review (id {id})", form.name.trim()))])
            }
            Command::Edit { class_id, file } => {
                let viewer = self.viewer()?;
                let existing = self.ctx.call(self.ctx.api().class(&class_id)).await.map_err(failed)?;
                let (form, image) = files::load_class_file(&file, CourseForm::from_course(&existing))
                    .await
                    .map_err(|e| format!("{e:#}"))?;
                update_class(&self.ctx, self.images.as_ref(), &viewer, &existing, &form, image.as_ref())
                    .await
                    .map_err(failed)?;
                self.go(Route::MyClasses);
                Ok(vec![Notice::success(format!("Updated '{}'", form.name.trim()))])
            }
            Command::Delete(class_id) => {
                self.viewer()?;
                self.ensure(Route::MyClasses);
                if !matches!(self.page, Page::MyClasses(_)) {
                    return Err("Only instructors can delete classes".to_string());
                }
                self.pending = Some(Pending::DeleteClass(class_id));
                Ok(vec![Notice::alert("Delete this class? This cannot be undone (yes/no)")])
            }

            Command::Approve(class_id) => {
                let Page::ManageClasses(view) = self.admin_page(Route::ManageClasses)? else {
                    return Err(ViewError::NotPermitted("Only admins can moderate classes").to_string());
                };
                view.approve(&class_id).await.map_err(failed)?;
                Ok(vec![Notice::success("Class approved")])
            }
            Command::Reject { class_id, feedback } => {
                let Page::ManageClasses(view) = self.admin_page(Route::ManageClasses)? else {
                    return Err(ViewError::NotPermitted("Only admins can moderate classes").to_string());
                };
                view.reject(&class_id, feedback.as_deref()).await.map_err(failed)?;
                Ok(vec![Notice::success("Class rejected")])
            }
            Command::MakeAdmin(user_id) => {
                let Page::ManageUsers(view) = self.admin_page(Route::ManageUsers)? else {
                    return Err(ViewError::NotPermitted("Only admins can change roles").to_string());
                };
                view.make_admin(&user_id).await.map_err(failed)?;
                Ok(vec![Notice::success("User is now an admin")])
            }
            Command::MakeInstructor(user_id) => {
                let Page::ManageUsers(view) = self.admin_page(Route::ManageUsers)? else {
                    return Err(ViewError::NotPermitted("Only admins can change roles").to_string());
                };
                view.make_instructor(&user_id).await.map_err(failed)?;
                Ok(vec![Notice::success("User is now an instructor")])
            }
            Command::Accept(application_id) => self.decide_application(&application_id, true).await,
            Command::Decline(application_id) => self.decide_application(&application_id, false).await,

            Command::Profile { name, photo } => {
                let viewer = self.viewer()?;
                let photo = match photo {
                    Some(path) => Some(files::load_image(&path).await.map_err(|e| format!("{e:#}"))?),
                    None => None,
                };
                let identity = update_profile(&self.ctx, self.images.as_ref(), &viewer, &ProfileForm { name, photo })
                    .await
                    .map_err(failed)?;
                self.profile = Some(self.resolver.resolve(&identity).await);
                Ok(vec![Notice::success("Profile updated")])
            }

            Command::Yes => self.answer(true).await,
            Command::No => self.answer(false).await,
        }
    }

    async fn select(&mut self, class_id: &str) -> Outcome {
        let Some(viewer) = self.profile.clone() else {
            let navigation = self.go(Route::SelectedClasses);
            let mut notices = self.moved(&Route::SelectedClasses, &navigation);
            notices.insert(0, Notice::error(ViewError::NotSignedIn.to_string()));
            return Ok(notices);
        };
        let course = self.ctx.call(self.ctx.api().class(class_id)).await.map_err(failed)?;
        add_to_cart(&self.ctx, Some(&viewer), &course).await.map_err(failed)?;
        if let Page::Cart(view) = &mut self.page {
            view.refresh();
        }
        Ok(vec![Notice::success(format!("Added '{}' to your cart", course.name))])
    }

    async fn pay(&mut self, card: CardDetails) -> Outcome {
        self.viewer()?;
        self.ensure(Route::Checkout);
        let Page::Checkout(view) = &self.page else {
            return Err("Only students can check out".to_string());
        };
        view.settled().await;
        let record = view.pay(&card).await.map_err(|e| e.client_message())?;
        self.go(CheckoutView::DONE);
        Ok(vec![Notice::success(format!(
            "Paid {} for {} class(es), transaction {}",
            render::money(record.amount),
            record.class_ids.len(),
            record.transaction_id
        ))])
    }

    /// Open an admin page and hand it back for a mutation.
    fn admin_page(&mut self, route: Route) -> std::result::Result<&mut Page, String> {
        self.viewer()?;
        self.ensure(route);
        Ok(&mut self.page)
    }

    async fn decide_application(&mut self, application_id: &str, approve: bool) -> Outcome {
        let Page::Applications(view) = self.admin_page(Route::Applications)? else {
            return Err(ViewError::NotPermitted("Only admins can review applications").to_string());
        };
        let applications = view.settled().await;
        let application = applications
            .loaded()
            .and_then(|list| list.iter().find(|a| a.id == application_id))
            .cloned()
            .ok_or_else(|| format!("No application {application_id}"))?;
        if approve {
            view.approve(&application).await.map_err(failed)?;
            Ok(vec![Notice::success(format!("{} is now an instructor", application.email))])
        } else {
            view.reject(&application).await.map_err(failed)?;
            Ok(vec![Notice::success("Application declined")])
        }
    }

    async fn answer(&mut self, yes: bool) -> Outcome {
        let Some(pending) = self.pending.take() else {
            return Err("Nothing to confirm".to_string());
        };
        let decision = Decided(yes);
        let result = match (&pending, &mut self.page) {
            (Pending::RemoveCartItem(id), Page::Cart(view)) => view.remove(id, &decision).await,
            (Pending::DeleteClass(id), Page::MyClasses(view)) => view.delete(id, &decision).await,
            _ => return Err("The page changed, nothing was done".to_string()),
        };
        match result {
            Ok(()) => Ok(vec![Notice::success(match pending {
                Pending::RemoveCartItem(_) => "Removed from your cart",
                Pending::DeleteClass(_) => "Class deleted",
            })]),
            Err(ViewError::Cancelled) => Ok(vec![Notice::info("Cancelled")]),
            Err(e) => Err(failed(e)),
        }
    }
}
