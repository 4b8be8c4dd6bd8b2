use serde_json::json;
use site_admin::i18n::{I18n, Locale};
use site_admin::media::{extract_video_id, is_valid_youtube_url, thumbnail_url, to_embed_url, ThumbnailQuality};

const VIDEO_ID: &str = "dQw4w9WgXcQ";

#[test]
fn test_every_link_form_embeds_the_same_video() {
    let links = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ?t=42",
        "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
    ];

    for link in links {
        assert_eq!(extract_video_id(link).as_deref(), Some(VIDEO_ID), "{}", link);
        assert_eq!(
            to_embed_url(link),
            format!("https://www.youtube.com/embed/{}", VIDEO_ID),
            "{}",
            link
        );
        assert!(is_valid_youtube_url(link), "{}", link);
    }
}

#[test]
fn test_embedding_is_idempotent() {
    let once = to_embed_url("https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(to_embed_url(&once), once);
}

#[test]
fn test_non_youtube_links_pass_through() {
    for link in ["https://vimeo.com/123456", "", "not a url"] {
        assert_eq!(to_embed_url(link), link);
        assert!(extract_video_id(link).is_none());
        assert!(!is_valid_youtube_url(link));
    }
}

#[test]
fn test_thumbnail_qualities() {
    assert_eq!(
        thumbnail_url("https://youtu.be/dQw4w9WgXcQ", ThumbnailQuality::default()).unwrap(),
        "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );
    assert_eq!(
        thumbnail_url("https://youtu.be/dQw4w9WgXcQ", ThumbnailQuality::Maxres).unwrap(),
        "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
    );
    assert!(thumbnail_url("https://vimeo.com/1", ThumbnailQuality::High).is_none());
}

#[test]
fn test_every_quality_has_its_fixed_file() {
    let expected = [
        (ThumbnailQuality::Default, "default.jpg"),
        (ThumbnailQuality::Medium, "mqdefault.jpg"),
        (ThumbnailQuality::High, "hqdefault.jpg"),
        (ThumbnailQuality::Standard, "sddefault.jpg"),
        (ThumbnailQuality::Maxres, "maxresdefault.jpg"),
    ];
    assert_eq!(ThumbnailQuality::ALL.len(), expected.len());

    for (quality, file) in expected {
        let url = thumbnail_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ", quality).unwrap();
        assert_eq!(url, format!("https://img.youtube.com/vi/{}/{}", VIDEO_ID, file));
        assert_eq!(quality.as_str().parse::<ThumbnailQuality>().unwrap(), quality);
    }
}

#[test]
fn test_bilingual_rows_render_in_either_locale() {
    let i18n = I18n::new(Locale::En);
    let faq = json!({
        "question_en": "How long does a website take?",
        "question_id": "Berapa lama pembuatan website?",
        "answer_en": "Usually four to six weeks.",
        "answer_id": ""
    });

    assert_eq!(
        i18n.localized(&faq, "question", Locale::Id).as_deref(),
        Some("Berapa lama pembuatan website?")
    );
    // empty Indonesian answer falls back to English
    assert_eq!(
        i18n.localized(&faq, "answer", Locale::Id).as_deref(),
        Some("Usually four to six weeks.")
    );
    assert_eq!(i18n.detect(Some("id-ID,id;q=0.9,en;q=0.8")), Locale::Id);
}
