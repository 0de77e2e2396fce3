//! Server-rendered gallery pages.
//!
//! Three views, all compile-time checked Maud markup with one small inline
//! stylesheet: a login form, the album index (cover thumbnails), and the
//! photo grid for a single album. Interpolation is auto-escaped, so album
//! and photo names are safe to render verbatim; URLs additionally go
//! through percent-encoding since names may contain spaces and friends.

use maud::{DOCTYPE, Markup, html};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters that cannot appear raw in a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const STYLE: &str = "\
:root { color-scheme: dark; }
body { margin: 0; background: #141414; color: #ddd; font: 15px/1.5 system-ui, sans-serif; }
header { display: flex; align-items: baseline; gap: 1rem; padding: 1rem 1.5rem; border-bottom: 1px solid #2a2a2a; }
header h1 { font-size: 1.1rem; margin: 0; }
header h1 a { color: inherit; text-decoration: none; }
header form { margin-left: auto; }
main { padding: 1.5rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 12px; }
.card { display: block; text-decoration: none; color: inherit; }
.card img { width: 100%; aspect-ratio: 1; object-fit: cover; border-radius: 4px; background: #222; }
.card .placeholder { width: 100%; aspect-ratio: 1; border-radius: 4px; background: #222; }
.card span { display: block; padding: 4px 2px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.photo-grid img { aspect-ratio: auto; }
.login { max-width: 280px; margin: 18vh auto; display: flex; flex-direction: column; gap: 10px; }
.login input { padding: 8px; border: 1px solid #333; border-radius: 4px; background: #1d1d1d; color: inherit; }
.login button, header button { padding: 8px 14px; border: 0; border-radius: 4px; background: #3a6ea5; color: #fff; cursor: pointer; }
.error { color: #e07070; }
a.download { color: #8ab4dd; font-size: 0.85rem; }
";

/// An album index entry: the album name plus its cover photo, when the
/// album has at least one photo.
pub struct AlbumCard {
    pub name: String,
    pub cover: Option<String>,
}

/// Percent-encode one path segment for use inside an href.
fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn layout(title: &str, header: Option<Markup>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (STYLE) }
            }
            body {
                @if let Some(header) = header {
                    (header)
                }
                main { (content) }
            }
        }
    }
}

fn page_header(root: &str, username: &str, breadcrumb: Option<&str>) -> Markup {
    html! {
        header {
            h1 {
                a href={ (root) "/" } { "Photoshelf" }
                @if let Some(crumb) = breadcrumb {
                    " / " (crumb)
                }
            }
            form method="post" action={ (root) "/logout" } {
                button type="submit" { "Sign out " (username) }
            }
        }
    }
}

/// The login form. `failed` adds an inline error after a rejected attempt.
pub fn login_page(root: &str, failed: bool) -> Markup {
    layout(
        "Sign in to Photoshelf",
        None,
        html! {
            form.login method="post" action={ (root) "/login" } {
                h1 { "Photoshelf" }
                @if failed {
                    p.error { "Invalid username or password." }
                }
                input type="text" name="username" placeholder="Username" autofocus required;
                input type="password" name="password" placeholder="Password" required;
                button type="submit" { "Sign in" }
            }
        },
    )
}

/// The album index: one card per album, cover thumbnail when available.
pub fn album_index(root: &str, username: &str, albums: &[AlbumCard]) -> Markup {
    layout(
        "Photoshelf",
        Some(page_header(root, username, None)),
        html! {
            @if albums.is_empty() {
                p { "No albums yet." }
            } @else {
                div.grid {
                    @for album in albums {
                        @let album_seg = encode_segment(&album.name);
                        a.card href={ (root) "/album/" (album_seg) } {
                            @if let Some(cover) = &album.cover {
                                img src={ (root) "/thumbnails/" (album_seg) "/" (encode_segment(cover)) }
                                    alt=(album.name) loading="lazy";
                            } @else {
                                div.placeholder {}
                            }
                            span { (album.name) }
                        }
                    }
                }
            }
        },
    )
}

/// The photo grid for one album. Thumbnails link to previews; each card
/// offers the original as a download.
pub fn album_page(root: &str, username: &str, album: &str, photos: &[String]) -> Markup {
    let album_seg = encode_segment(album);
    layout(
        &format!("{album} | Photoshelf"),
        Some(page_header(root, username, Some(album))),
        html! {
            @if photos.is_empty() {
                p { "This album is empty." }
            } @else {
                div.grid.photo-grid {
                    @for photo in photos {
                        @let photo_seg = encode_segment(photo);
                        div.card {
                            a href={ (root) "/previews/" (album_seg) "/" (photo_seg) } {
                                img src={ (root) "/thumbnails/" (album_seg) "/" (photo_seg) }
                                    alt=(photo) loading="lazy";
                            }
                            span { (photo) }
                            a.download href={ (root) "/download/" (album_seg) "/" (photo_seg) } {
                                "Download original"
                            }
                        }
                    }
                }
            }
        },
    )
}
