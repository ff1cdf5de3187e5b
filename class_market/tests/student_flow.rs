//! Student journey: browse, select, pay, learn, apply to teach.

mod common;

use class_market::{
    Course,
    payment::CardDetails,
    progress::ProgressStore,
    upload::FALLBACK_CARD_IMAGE,
    views::{
        CheckoutError, Decided, ViewError,
        cart::{CartView, add_to_cart},
        catalog::{CatalogView, ClassDetailView},
        checkout::CheckoutView,
        home::HomeView,
        student::{ApplicationForm, CoursePlayer, EnrolledView, PaymentHistoryView, apply_instructor},
    },
};
use common::{DECLINED_CARD, FakeGateway, Harness, class_doc};
use std::sync::{Arc, atomic::Ordering};

const STUDENT: &str = "stu@example.com";
const TEACHER: &str = "ins@example.com";

fn good_card() -> CardDetails {
    CardDetails::new("4242 4242 4242 4242", 12, 2030, "123")
}

async fn course(h: &Harness, id: &str) -> Course {
    h.ctx.api().class(id).await.unwrap()
}

// === Catalog ===

#[tokio::test]
async fn test_catalog_lists_only_approved() {
    let h = Harness::start().await;
    h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    h.backend.seed_class(class_doc("Oil Painting", TEACHER, "pending", 10, 30.0));
    h.backend.seed_class(class_doc("Sketching", TEACHER, "rejected", 10, 30.0));

    let mut catalog = CatalogView::new(h.ctx.clone());
    catalog.refresh();
    let classes = catalog.settled().await.loaded().cloned().unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].name, "Watercolor");

    catalog.search("oil");
    assert_eq!(catalog.state().loaded().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_cards_fall_back_when_image_does_not_load() {
    let h = Harness::start().await;
    for (name, image) in [("Loads", "cover.png"), ("Missing", "missing.png"), ("Html", "page.png")] {
        let mut doc = class_doc(name, TEACHER, "approved", 10, 30.0);
        doc["image"] = format!("{}/images/{image}", h.backend.url).into();
        h.backend.seed_class(doc);
    }

    let mut catalog = CatalogView::new(h.ctx.clone());
    catalog.refresh();
    let classes = catalog.settled().await.loaded().cloned().unwrap();
    let card = |name: &str| {
        classes
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.card_image().to_string())
            .unwrap()
    };

    assert_eq!(card("Loads"), format!("{}/images/cover.png", h.backend.url));
    assert_eq!(card("Missing"), FALLBACK_CARD_IMAGE);
    assert_eq!(card("Html"), FALLBACK_CARD_IMAGE);
}

#[tokio::test]
async fn test_class_detail_checks_its_image() {
    let h = Harness::start().await;
    let mut doc = class_doc("Missing", TEACHER, "approved", 10, 30.0);
    doc["image"] = format!("{}/images/missing.png", h.backend.url).into();
    let id = h.backend.seed_class(doc);

    let mut detail = ClassDetailView::new(h.ctx.clone(), id);
    detail.refresh();
    let course = detail.settled().await.loaded().cloned().unwrap();
    assert!(course.image.as_deref().is_some_and(|url| url.ends_with("/images/missing.png")));
    assert_eq!(course.card_image(), FALLBACK_CARD_IMAGE);
}

#[tokio::test]
async fn test_class_detail_missing_class_fails() {
    let h = Harness::start().await;
    let mut detail = ClassDetailView::new(h.ctx.clone(), "nope");
    detail.refresh();
    assert_eq!(detail.settled().await.error(), Some("Not found"));
}

#[tokio::test]
async fn test_home_popular_sorted_by_enrollment() {
    let h = Harness::start().await;
    let mut quiet = class_doc("Quiet", TEACHER, "approved", 10, 10.0);
    quiet["totalEnrolled"] = 1.into();
    let mut busy = class_doc("Busy", TEACHER, "approved", 10, 10.0);
    busy["totalEnrolled"] = 50.into();
    h.backend.seed_class(quiet);
    h.backend.seed_class(busy);
    h.backend.seed_user(TEACHER, "Ines", "instructor");

    let mut home = HomeView::new(h.ctx.clone());
    home.refresh();
    let (popular, instructors) = home.settled().await;
    let names: Vec<_> = popular.loaded().unwrap().iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, ["Busy", "Quiet"]);
    assert_eq!(instructors.loaded().map(Vec::len), Some(1));
}

// === Cart ===

#[tokio::test]
async fn test_add_to_cart_requires_sign_in() {
    let h = Harness::start().await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    let class = course(&h, &id).await;

    let err = add_to_cart(&h.ctx, None, &class).await.unwrap_err();
    assert!(matches!(err, ViewError::NotSignedIn));
}

#[tokio::test]
async fn test_duplicate_add_is_rejected() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    let class = course(&h, &id).await;

    add_to_cart(&h.ctx, Some(&viewer), &class).await.unwrap();
    let err = add_to_cart(&h.ctx, Some(&viewer), &class).await.unwrap_err();
    assert!(matches!(err, ViewError::AlreadyInCart));
    assert_eq!(h.backend.cart_of(STUDENT).len(), 1);
}

#[tokio::test]
async fn test_sold_out_class_cannot_be_selected() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Full", TEACHER, "approved", 0, 30.0));
    let class = course(&h, &id).await;

    let err = add_to_cart(&h.ctx, Some(&viewer), &class).await.unwrap_err();
    assert!(matches!(err, ViewError::SoldOut));
    assert!(h.backend.cart_of(STUDENT).is_empty());
}

#[tokio::test]
async fn test_instructor_cannot_select_classes() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(TEACHER, "instructor").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    let class = course(&h, &id).await;

    let err = add_to_cart(&h.ctx, Some(&viewer), &class).await.unwrap_err();
    assert!(matches!(err, ViewError::NotPermitted(_)));
}

#[tokio::test]
async fn test_cart_remove_needs_confirmation() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    add_to_cart(&h.ctx, Some(&viewer), &course(&h, &id).await).await.unwrap();

    let mut cart = CartView::new(h.ctx.clone(), &viewer);
    cart.refresh();
    let entries = cart.settled().await.loaded().cloned().unwrap();
    assert_eq!(cart.total(), 30.0);
    let item_id = entries[0].item.id.clone();

    let err = cart.remove(&item_id, &Decided(false)).await.unwrap_err();
    assert!(matches!(err, ViewError::Cancelled));
    assert_eq!(h.backend.cart_of(STUDENT).len(), 1);

    cart.remove(&item_id, &Decided(true)).await.unwrap();
    assert!(h.backend.cart_of(STUDENT).is_empty());
    assert_eq!(cart.settled().await.loaded().map(Vec::len), Some(0));
    assert!(!cart.can_checkout());
}

// === Checkout ===

#[tokio::test]
async fn test_empty_cart_blocks_checkout() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let gateway = Arc::new(FakeGateway::default());

    let mut checkout = CheckoutView::new(h.ctx.clone(), gateway.clone(), &viewer);
    checkout.refresh();
    checkout.settled().await;

    assert!(!checkout.can_checkout());
    let err = checkout.pay(&good_card()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(gateway.confirmations.load(Ordering::SeqCst), 0);
    assert!(h.backend.state().payments.is_empty());
}

#[tokio::test]
async fn test_successful_checkout_enrolls_student() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let a = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    let b = h.backend.seed_class(class_doc("Ink", TEACHER, "approved", 5, 12.5));
    add_to_cart(&h.ctx, Some(&viewer), &course(&h, &a).await).await.unwrap();
    add_to_cart(&h.ctx, Some(&viewer), &course(&h, &b).await).await.unwrap();

    let mut checkout = CheckoutView::new(h.ctx.clone(), Arc::new(FakeGateway::default()), &viewer);
    checkout.refresh();
    checkout.settled().await;
    assert_eq!(checkout.total(), 42.5);

    let record = checkout.pay(&good_card()).await.unwrap();
    assert_eq!(record.amount, 42.5);
    assert_eq!(record.currency, "usd");
    assert!(record.transaction_id.starts_with("pi_"));
    assert_eq!(CheckoutView::DONE.path(), "/dashboard/payment-history");

    assert!(h.backend.cart_of(STUDENT).is_empty());
    assert_eq!(h.backend.class(&b).unwrap()["availableSeats"], 4);

    let mut enrolled = EnrolledView::new(h.ctx.clone(), &viewer);
    enrolled.refresh();
    assert_eq!(enrolled.settled().await.loaded().map(Vec::len), Some(2));

    let mut history = PaymentHistoryView::new(h.ctx.clone(), &viewer);
    history.refresh();
    let payments = history.settled().await.loaded().cloned().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].transaction_id, record.transaction_id);

    let err = add_to_cart(&h.ctx, Some(&viewer), &course(&h, &a).await)
        .await
        .unwrap_err();
    assert!(matches!(err, ViewError::AlreadyEnrolled));
}

#[tokio::test]
async fn test_declined_card_records_nothing() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    add_to_cart(&h.ctx, Some(&viewer), &course(&h, &id).await).await.unwrap();

    let mut checkout = CheckoutView::new(h.ctx.clone(), Arc::new(FakeGateway::default()), &viewer);
    checkout.refresh();
    checkout.settled().await;

    let card = CardDetails::new(DECLINED_CARD, 12, 2030, "123");
    let err = checkout.pay(&card).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Payment(_)));
    assert!(h.backend.state().payments.is_empty());
    assert_eq!(h.backend.cart_of(STUDENT).len(), 1);
}

#[tokio::test]
async fn test_invalid_card_never_reaches_gateway() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    add_to_cart(&h.ctx, Some(&viewer), &course(&h, &id).await).await.unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let mut checkout = CheckoutView::new(h.ctx.clone(), gateway.clone(), &viewer);
    checkout.refresh();
    checkout.settled().await;

    let err = checkout
        .pay(&CardDetails::new("4242 4242 4242 4241", 12, 2030, "123"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Payment(_)));
    assert_eq!(gateway.confirmations.load(Ordering::SeqCst), 0);
}

// === Course player ===

#[tokio::test]
async fn test_course_player_requires_enrollment() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;
    let id = h.backend.seed_class(class_doc("Watercolor", TEACHER, "approved", 10, 30.0));
    let progress = Arc::new(ProgressStore::new(h.store.clone()));

    let mut player = CoursePlayer::new(h.ctx.clone(), &viewer, id.clone(), progress.clone());
    player.refresh();
    assert_eq!(player.settled().await.error(), Some("You are not enrolled in this class"));

    h.backend
        .state()
        .enrolled
        .entry(STUDENT.to_string())
        .or_default()
        .push(id.clone());
    player.refresh();
    assert!(player.settled().await.loaded().is_some());

    assert_eq!(player.percent(), 0);
    assert!(player.toggle_complete((0, 1)).unwrap());
    assert_eq!(player.percent(), 50);
    assert!(player.toggle_complete((3, 0)).is_err());
    assert!(!player.toggle_complete((0, 1)).unwrap());
    assert_eq!(player.percent(), 0);
}

// === Applications ===

#[tokio::test]
async fn test_student_applies_to_teach() {
    let h = Harness::start().await;
    let viewer = h.sign_in_as(STUDENT, "user").await;

    let blank = ApplicationForm::default();
    assert!(matches!(
        apply_instructor(&h.ctx, &viewer, &blank).await,
        Err(ViewError::Validation(_))
    ));

    let form = ApplicationForm {
        title: "Painter".into(),
        experience: "Ten years of workshops".into(),
    };
    apply_instructor(&h.ctx, &viewer, &form).await.unwrap();

    let applications = h.backend.state().applications.clone();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0]["email"], STUDENT);
    assert_eq!(applications[0]["status"], "pending");
}
