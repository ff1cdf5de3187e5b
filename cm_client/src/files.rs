//! Local files the client reads: class descriptions and images.

use anyhow::{Context, Result};
use class_market::{
    models::{CourseForm, Module},
    views::instructor::ImageFile,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A class described on disk, for `publish` and `edit`.
///
/// ```json
/// {
///   "name": "Watercolor Basics",
///   "price": 30,
///   "availableSeats": 12,
///   "image": "cover.png",
///   "modules": [{ "title": "Intro", "lessons": [
///     { "title": "Brushes", "videoLink": "https://...", "duration": 10 }
///   ]}]
/// }
/// ```
///
/// `image` is relative to the file's directory. Fields left out keep the
/// value of the form the file is applied to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassFile {
    name: Option<String>,
    price: Option<f64>,
    available_seats: Option<u32>,
    image: Option<PathBuf>,
    modules: Option<Vec<Module>>,
}

pub async fn load_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    Ok(ImageFile { name, bytes })
}

/// Read a class file over `base` and the image it points at, if any.
///
/// `publish` starts from an empty form; `edit` starts from the class as it
/// is now, so the file only needs the fields that change.
pub async fn load_class_file(path: &Path, base: CourseForm) -> Result<(CourseForm, Option<ImageFile>)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ClassFile =
        serde_json::from_str(&raw).with_context(|| format!("Invalid class file {}", path.display()))?;

    let image = match &file.image {
        Some(relative) => {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            Some(load_image(&base.join(relative)).await?)
        }
        None => None,
    };

    let form = CourseForm {
        name: file.name.unwrap_or(base.name),
        price: file.price.unwrap_or(base.price),
        available_seats: file.available_seats.unwrap_or(base.available_seats),
        modules: file.modules.unwrap_or(base.modules),
    };
    Ok((form, image))
}
