//! Built-in catalog templates seeded into every new catalog

use serde_json::json;

use super::catalog_models::{NewCatalogTemplate, TemplateCategory, TemplateSize};
use super::models::{NewPlaceholder, PlaceholderType, Template, TemplateStatus};

/// Returns the built-in templates in seeding order
pub fn builtin_templates() -> Vec<NewCatalogTemplate> {
    vec![
        corporate_presentation(),
        course_lesson(),
        product_launch(),
        social_story(),
        quote_card(),
        photo_slideshow(),
    ]
}

fn corporate_presentation() -> NewCatalogTemplate {
    let template = Template::new("Corporate Presentation", 1920, 1080)
        .with_description("Clean title slide with presenter video and company logo")
        .with_duration(30.0)
        .with_background("#0F172A")
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Title", PlaceholderType::Text)
                .with_geometry(160.0, 120.0, 1600.0, 160.0)
                .with_timing(0.0, 30.0)
                .with_required(true)
                .with_style("fontSize", json!(72))
                .with_style("color", json!("#FFFFFF")),
        )
        .with_placeholder(
            NewPlaceholder::new("Presenter", PlaceholderType::Video)
                .with_geometry(1120.0, 360.0, 640.0, 600.0)
                .with_timing(2.0, 28.0),
        )
        .with_placeholder(
            NewPlaceholder::new("Logo", PlaceholderType::Image)
                .with_geometry(160.0, 880.0, 240.0, 120.0)
                .with_timing(0.0, 30.0),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Business)
        .with_size(TemplateSize::Landscape)
        .with_tags(["corporate", "presentation", "professional"])
        .with_platforms(["youtube", "linkedin"])
        .featured()
}

fn course_lesson() -> NewCatalogTemplate {
    let template = Template::new("Course Lesson", 1920, 1080)
        .with_description("Lesson layout with narrated slides and a topic caption")
        .with_duration(60.0)
        .with_background("#FFFFFF")
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Topic", PlaceholderType::Text)
                .with_geometry(120.0, 60.0, 1680.0, 120.0)
                .with_timing(0.0, 60.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Slide", PlaceholderType::Image)
                .with_geometry(120.0, 220.0, 1200.0, 800.0)
                .with_timing(0.0, 60.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Narration", PlaceholderType::Audio).with_timing(0.0, 60.0),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Educational)
        .with_size(TemplateSize::Landscape)
        .with_tags(["education", "course", "tutorial"])
        .with_platforms(["youtube"])
}

fn product_launch() -> NewCatalogTemplate {
    let template = Template::new("Product Launch Promo", 1080, 1920)
        .with_description("Vertical promo with hero shot, headline and call to action")
        .with_duration(15.0)
        .with_background("#111827")
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Hero", PlaceholderType::Video)
                .with_geometry(0.0, 0.0, 1080.0, 1200.0)
                .with_timing(0.0, 15.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Headline", PlaceholderType::Text)
                .with_geometry(80.0, 1260.0, 920.0, 240.0)
                .with_timing(1.0, 14.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Call To Action", PlaceholderType::Text)
                .with_geometry(80.0, 1600.0, 920.0, 160.0)
                .with_timing(10.0, 5.0)
                .with_default("Shop now"),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Marketing)
        .with_size(TemplateSize::Portrait)
        .with_tags(["promo", "product", "launch"])
        .with_platforms(["instagram", "tiktok"])
        .featured()
        .premium()
}

fn social_story() -> NewCatalogTemplate {
    let template = Template::new("Social Story", 1080, 1920)
        .with_description("Full-bleed story clip with a caption and background music")
        .with_duration(10.0)
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Clip", PlaceholderType::Video)
                .with_geometry(0.0, 0.0, 1080.0, 1920.0)
                .with_timing(0.0, 10.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Caption", PlaceholderType::Text)
                .with_geometry(60.0, 1500.0, 960.0, 200.0)
                .with_timing(0.5, 9.5),
        )
        .with_placeholder(
            NewPlaceholder::new("Music", PlaceholderType::Audio).with_timing(0.0, 10.0),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Social)
        .with_size(TemplateSize::Portrait)
        .with_tags(["story", "social", "vertical"])
        .with_platforms(["instagram", "tiktok", "snapchat"])
}

fn quote_card() -> NewCatalogTemplate {
    let template = Template::new("Quote Card", 1080, 1080)
        .with_description("Square animated quote with author line")
        .with_duration(8.0)
        .with_background("#F5F5F4")
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Quote", PlaceholderType::Text)
                .with_geometry(90.0, 240.0, 900.0, 480.0)
                .with_timing(0.0, 8.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Author", PlaceholderType::Text)
                .with_geometry(90.0, 780.0, 900.0, 100.0)
                .with_timing(1.0, 7.0),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Social)
        .with_size(TemplateSize::Square)
        .with_tags(["quote", "social", "text"])
        .with_platforms(["instagram", "facebook"])
}

fn photo_slideshow() -> NewCatalogTemplate {
    let template = Template::new("Photo Slideshow", 1440, 1080)
        .with_description("Classic 4:3 slideshow for family photos")
        .with_duration(20.0)
        .with_status(TemplateStatus::Valid)
        .with_placeholder(
            NewPlaceholder::new("Photo 1", PlaceholderType::Image)
                .with_geometry(0.0, 0.0, 1440.0, 1080.0)
                .with_timing(0.0, 10.0)
                .with_required(true),
        )
        .with_placeholder(
            NewPlaceholder::new("Photo 2", PlaceholderType::Image)
                .with_geometry(0.0, 0.0, 1440.0, 1080.0)
                .with_timing(10.0, 10.0),
        )
        .with_placeholder(
            NewPlaceholder::new("Soundtrack", PlaceholderType::Audio).with_timing(0.0, 20.0),
        );

    NewCatalogTemplate::new(template, TemplateCategory::Personal)
        .with_size(TemplateSize::Classic)
        .with_tags(["photos", "family", "slideshow"])
        .with_platforms(["facebook"])
}
