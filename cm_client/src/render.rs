//! Plain-text renderings of the marketplace records.

use class_market::{
    Course, Loadable,
    models::{AppProfile, CartEntry, InstructorApplication, PaymentRecord, UserRecord, cart_total},
    progress::LessonRef,
};
use std::collections::BTreeSet;

pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Minutes as "1h 05m", or "45m" under an hour.
pub fn duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}

/// Lines for a fetched value: a placeholder while loading, the message on failure.
pub fn loadable<T>(state: &Loadable<T>, render: impl FnOnce(&T) -> Vec<String>) -> Vec<String> {
    match state {
        Loadable::Idle => Vec::new(),
        Loadable::Loading => vec!["Loading...".to_string()],
        Loadable::Failed(message) => vec![format!("Error: {message}")],
        Loadable::Loaded(value) => render(value),
    }
}

fn seats(course: &Course) -> String {
    if course.is_sold_out() {
        "sold out".to_string()
    } else {
        format!("{} seats left", course.available_seats)
    }
}

pub fn course_line(course: &Course) -> String {
    format!(
        "{}  {}  by {}  {}  {}  [{}]",
        course.id,
        course.name,
        course.instructor_name,
        money(course.price),
        seats(course),
        course.status
    )
}

pub fn course_list(courses: &[Course], empty: &str) -> Vec<String> {
    if courses.is_empty() {
        return vec![empty.to_string()];
    }
    courses.iter().map(course_line).collect()
}

pub fn course_detail(course: &Course) -> Vec<String> {
    let mut lines = vec![
        course.name.clone(),
        format!("Instructor: {} <{}>", course.instructor_name, course.instructor_email),
        format!("Price: {}  ({})", money(course.price), seats(course)),
        format!(
            "{} lessons, {}, {} enrolled",
            course.lesson_count(),
            duration(course.total_duration),
            course.total_enrolled
        ),
        format!("Image: {}", course.card_image()),
    ];
    if let Some(feedback) = &course.feedback {
        lines.push(format!("Feedback: {feedback}"));
    }
    for (m_idx, module) in course.modules.iter().enumerate() {
        lines.push(format!("{}. {}", m_idx + 1, module.title));
        for (l_idx, lesson) in module.lessons.iter().enumerate() {
            lines.push(format!(
                "   {}.{} {} ({})",
                m_idx + 1,
                l_idx + 1,
                lesson.title,
                duration(lesson.duration)
            ));
        }
    }
    lines
}

/// Outline with completion marks and the overall percentage.
pub fn player(course: &Course, done: &BTreeSet<LessonRef>, percent: u8) -> Vec<String> {
    let mut lines = vec![format!("{}  {}% complete", course.name, percent)];
    for (m_idx, module) in course.modules.iter().enumerate() {
        lines.push(format!("{}. {}", m_idx + 1, module.title));
        for (l_idx, lesson) in module.lessons.iter().enumerate() {
            let mark = if done.contains(&(m_idx, l_idx)) { "x" } else { " " };
            lines.push(format!(
                "   [{mark}] {}.{} {}  {}",
                m_idx + 1,
                l_idx + 1,
                lesson.title,
                lesson.video_link
            ));
        }
    }
    lines
}

pub fn cart(entries: &[CartEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["Your cart is empty".to_string()];
    }
    let mut lines: Vec<String> = entries
        .iter()
        .map(|e| format!("{}  {}  {}", e.item.id, e.title(), money(e.price())))
        .collect();
    lines.push(format!("Total: {}", money(cart_total(entries))));
    lines
}

pub fn payments(records: &[PaymentRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No payments yet".to_string()];
    }
    records
        .iter()
        .map(|p| {
            format!(
                "{}  {}  {} {}  {} class(es)",
                p.date.format("%Y-%m-%d %H:%M"),
                p.transaction_id,
                money(p.amount),
                p.currency.to_uppercase(),
                p.class_ids.len()
            )
        })
        .collect()
}

pub fn user_line(user: &UserRecord) -> String {
    format!(
        "{}  {}  <{}>  {}",
        user.id.as_deref().unwrap_or("-"),
        user.name.as_deref().unwrap_or("(no name)"),
        user.email,
        user.role
    )
}

pub fn users(records: &[UserRecord], empty: &str) -> Vec<String> {
    if records.is_empty() {
        return vec![empty.to_string()];
    }
    records.iter().map(user_line).collect()
}

pub fn applications(records: &[InstructorApplication]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No applications".to_string()];
    }
    records
        .iter()
        .map(|a| format!("{}  {} <{}>  {}  [{}]  {}", a.id, a.name, a.email, a.title, a.status, a.experience))
        .collect()
}

pub fn profile(profile: &AppProfile) -> Vec<String> {
    let mut lines = vec![
        format!("{} <{}>", profile.name, profile.email),
        format!("Role: {}", profile.role),
    ];
    if let Some(photo) = &profile.photo_url {
        lines.push(format!("Photo: {photo}"));
    }
    if profile.is_from_auth {
        lines.push("(no backend record, showing sign-in details)".to_string());
    }
    lines
}
