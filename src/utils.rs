use chrono::Local;

/// Points an image URL at its thumbnail: `a/b/photo.jpg` -> `a/b/thumbnails/photo_thumb.jpg`.
/// SVGs and files without an extension are returned unchanged.
pub fn thumbnail_url(url: &str) -> String {
    let (dir, filename) = match url.rsplit_once('/') {
        Some((dir, filename)) => (Some(dir), filename),
        None => (None, url),
    };
    let Some((stem, extension)) = filename.rsplit_once('.') else {
        return url.to_string();
    };
    if extension.eq_ignore_ascii_case("svg") {
        return url.to_string();
    }
    let thumb = format!("thumbnails/{stem}_thumb.{extension}");
    match dir {
        Some(dir) => format!("{dir}/{thumb}"),
        None => thumb,
    }
}

/// One-line timing summary for a finished API call.
pub fn final_log_line(call: &str, url: &str, elapsed_ms: u128, status_message: &str) -> String {
    format!(
        "Final log: {} | {} {} | Response received in {}ms | {}",
        Local::now().format("%d/%m/%Y, %H:%M:%S"),
        call,
        url,
        elapsed_ms,
        status_message
    )
}
