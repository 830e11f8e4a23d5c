//! Label and markdown widgets — static content, no data binding
//!
//! Any HTML that reaches these views is sanitized before display. The
//! label strips markup down to plain text; the markdown view renders a
//! basic subset (headings, emphasis, code, lists) natively.

use egui::{Align, Layout, RichText, Ui};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{WidgetAction, WidgetContext, WidgetView};

/// Strip every tag and keep text content only
fn sanitize_to_text(html: &str) -> String {
    ammonia::Builder::empty()
        .clean(html)
        .to_string()
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

// ==================== Label ====================

#[derive(Default)]
pub struct LabelView;

impl WidgetView for LabelView {
    fn type_key(&self) -> &'static str {
        type_keys::LABEL
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Label(s) => s,
            _ => Default::default(),
        };

        let body = if settings.use_html {
            sanitize_to_text(&settings.label_text)
        } else {
            settings.label_text.clone()
        };

        let mut text = RichText::new(body);
        if let Some(size) = settings.font_size {
            text = text.size(size);
        }

        let layout = match settings.text_align.as_deref() {
            Some("center") => Layout::top_down(Align::Center),
            Some("right") => Layout::top_down(Align::Max),
            _ => Layout::top_down(Align::Min),
        };
        ui.with_layout(layout, |ui| {
            ui.label(text);
        });

        Vec::new()
    }
}

// ==================== Markdown ====================

#[derive(Default)]
pub struct MarkdownView;

impl WidgetView for MarkdownView {
    fn type_key(&self) -> &'static str {
        type_keys::MARKDOWN
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Markdown(s) => s,
            _ => Default::default(),
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if settings.use_raw_html {
                    // Raw HTML is sanitized down to its text content
                    ui.label(sanitize_to_text(settings.body()));
                } else {
                    render_markdown(ui, settings.body());
                }
            });

        Vec::new()
    }
}

/// Render a basic markdown subset into labels
fn render_markdown(ui: &mut Ui, markdown: &str) {
    let parser = Parser::new_ext(markdown, Options::empty());

    let mut heading: Option<HeadingLevel> = None;
    let mut in_item = false;
    let mut line = String::new();

    let mut flush =
        |ui: &mut Ui, line: &mut String, heading: Option<HeadingLevel>, in_item: bool| {
            if line.is_empty() {
                return;
            }
            let text = if in_item {
                format!("• {}", line)
            } else {
                line.clone()
            };
            let rich = match heading {
                Some(HeadingLevel::H1) => RichText::new(text).size(22.0).strong(),
                Some(HeadingLevel::H2) => RichText::new(text).size(18.0).strong(),
                Some(_) => RichText::new(text).size(15.0).strong(),
                None => RichText::new(text),
            };
            ui.label(rich);
            line.clear();
        };

    for event in parser {
        match event {
            Event::Start(Tag::Heading(level, ..)) => heading = Some(level),
            Event::End(Tag::Heading(..)) => {
                flush(ui, &mut line, heading, false);
                heading = None;
            }
            Event::Start(Tag::Item) => in_item = true,
            Event::End(Tag::Item) => {
                flush(ui, &mut line, None, true);
                in_item = false;
            }
            Event::End(Tag::Paragraph) => flush(ui, &mut line, None, in_item),
            Event::Text(text) | Event::Code(text) => {
                line.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => {
                flush(ui, &mut line, heading, in_item);
            }
            Event::Html(html) => {
                line.push_str(&sanitize_to_text(&html));
            }
            _ => {}
        }
    }
    flush(ui, &mut line, heading, in_item);
}
