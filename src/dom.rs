//! Small helpers over `scraper` element handles.

use reqwest::Url;
use scraper::{ElementRef, Node, Selector};

use crate::error::{Error, Result};

/// All descendant text joined, with runs of whitespace collapsed.
pub fn text_trimmed(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Descendant text where every `<br>` becomes a newline. Whitespace inside
/// each line is collapsed.
pub fn text_with_breaks(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => raw.push_str(t),
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`text_trimmed`] but skipping anything inside `<script>`.
pub fn text_without_scripts(el: ElementRef<'_>) -> String {
    el.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(t) => Some((node, &**t)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|e| e.name() == "script")
        })
        .flat_map(|(_, t)| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

pub fn first<'a>(scope: ElementRef<'a>, selector: &Selector, what: &str) -> Result<ElementRef<'a>> {
    scope
        .select(selector)
        .next()
        .ok_or_else(|| Error::structure(format!("missing {what}")))
}

pub fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

pub fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Resolves `href` against `base`, e.g. "filme.php?cf=1" on a listing page.
pub fn resolve_url(base: &str, href: &str) -> Result<Url> {
    let base = Url::parse(base).map_err(|_| Error::value("url", base))?;
    base.join(href.trim()).map_err(|_| Error::value("url", href))
}

/// Value of query parameter `name` in a possibly relative link.
pub fn query_param(href: &str, name: &str) -> Option<String> {
    let url = resolve_url("http://localhost/", href).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Last path segment of an image source.
pub fn file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').next().unwrap_or(path)
}
