mod support;

use chrono::{TimeDelta, Utc};
use tempfile::TempDir;

use pagefeed::domain::{MediaKind, PageTarget};
use pagefeed::scraper::extractor::{ImageElement, VideoElement};
use pagefeed::scraper::{
    BlockOutcome, DebugArtifacts, DelayRange, PageScraper, ScraperConfig, StepOutcome,
};
use pagefeed::video::DisabledResolver;

use support::{comment_block, post_block, text_block, FakePage, Navigation, TableResolver, PAGE_NAME, PAGE_URL};

fn target() -> PageTarget {
    PageTarget::new(PAGE_NAME, PAGE_URL, "bigclub")
}

fn image_block(index: usize) -> pagefeed::scraper::BlockSnapshot {
    let mut block = post_block(index, "Photos from the training session today", "2");
    block.images = vec![
        ImageElement {
            src: Some("https://scontent.xx.fbcdn.net/v/t1.0-1/p50x50/logo.jpg".into()),
            ..Default::default()
        },
        ImageElement {
            src: Some("https://scontent.xx.fbcdn.net/v/t39/training.jpg".into()),
            width: Some("720".into()),
            height: Some("480".into()),
            in_svg: false,
        },
    ];
    block
}

fn video_block(index: usize) -> pagefeed::scraper::BlockSnapshot {
    let mut block = post_block(index, "Highlights from last night's match", "3");
    block.video = Some(VideoElement {
        src: Some("blob:https://www.facebook.com/0f1e".into()),
        poster: Some("https://scontent.xx.fbcdn.net/v/poster.jpg".into()),
    });
    block.video_links = vec!["https://www.facebook.com/bigclub/videos/777/".into()];
    block
}

#[tokio::test]
async fn test_full_page_extraction() {
    let page = FakePage::new(vec![
        post_block(0, "Hello world! We open at noon on Saturday.", "1"),
        comment_block(1),
        image_block(2),
        text_block(3, "Big Club\n2d"),
        video_block(4),
    ]);
    let resolver = TableResolver::default().with(
        "https://www.facebook.com/watch/?v=777",
        "https://video.xx.fbcdn.net/v/777.mp4",
    );
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &resolver)
        .run(&page, &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();

    assert_eq!(report.navigation, StepOutcome::Done);
    assert_eq!(
        report.blocks,
        vec![
            BlockOutcome::Accepted,
            BlockOutcome::Comment,
            BlockOutcome::Accepted,
            BlockOutcome::TooShort,
            BlockOutcome::Accepted,
        ]
    );
    assert!(!report.low_yield);

    let posts = &report.posts;
    assert_eq!(posts.len(), 3);

    assert_eq!(posts[0].description, "Hello world! We open at noon on Saturday.");
    assert_eq!(posts[0].link, "https://www.facebook.com/bigclub/posts/1");
    assert_eq!(posts[0].guid, posts[0].link);
    assert_eq!(posts[0].media_kind, MediaKind::None);

    assert_eq!(posts[1].media_kind, MediaKind::Image);
    assert_eq!(
        posts[1].image_url.as_deref(),
        Some("https://scontent.xx.fbcdn.net/v/t39/training.jpg")
    );

    assert_eq!(posts[2].media_kind, MediaKind::Video);
    assert_eq!(
        posts[2].video_url.as_deref(),
        Some("https://video.xx.fbcdn.net/v/777.mp4")
    );
    assert_eq!(
        posts[2].image_url.as_deref(),
        Some("https://scontent.xx.fbcdn.net/v/poster.jpg")
    );

    for post in posts {
        assert!(post.media_is_consistent());
        // "3h" in every block
        assert!(post.published_at < Utc::now() - TimeDelta::minutes(170));
        assert!(post.published_at > Utc::now() - TimeDelta::minutes(190));
    }
}

#[tokio::test]
async fn test_low_yield_captures_debug_artifacts() {
    let dir = TempDir::new().unwrap();
    let debug = DebugArtifacts::new(dir.path().join("bigclub"));
    let page = FakePage::new(vec![post_block(0, "Only one post on this page", "1")]);
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &debug)
        .await
        .unwrap();

    assert_eq!(report.posts.len(), 1);
    assert!(report.low_yield);
    assert!(dir.path().join("bigclub").join(DebugArtifacts::SCREENSHOT).exists());
    assert!(dir.path().join("bigclub").join(DebugArtifacts::HTML).exists());
}

#[tokio::test]
async fn test_navigation_timeout_yields_empty_report() {
    let dir = TempDir::new().unwrap();
    let debug = DebugArtifacts::new(dir.path().join("bigclub"));
    let mut page = FakePage::new(vec![post_block(0, "Never reached by the scraper", "1")]);
    page.navigation = Navigation::Timeout;
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &debug)
        .await
        .unwrap();

    assert!(report.navigation.is_failed());
    assert!(report.posts.is_empty());
    assert!(report.load.is_none());
    assert_eq!(page.count_calls("count"), 0);
    assert_eq!(page.count_calls("screenshot"), 0);
    assert!(!dir
        .path()
        .join("bigclub")
        .join(DebugArtifacts::ERROR_SCREENSHOT)
        .exists());
}

#[tokio::test]
async fn test_fatal_error_captures_error_screenshot() {
    let dir = TempDir::new().unwrap();
    let debug = DebugArtifacts::new(dir.path().join("bigclub"));
    let mut page = FakePage::new(vec![]);
    page.navigation = Navigation::Crash;
    let config = ScraperConfig::immediate();

    let result = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &debug)
        .await;

    assert!(result.is_err());
    assert!(dir
        .path()
        .join("bigclub")
        .join(DebugArtifacts::ERROR_SCREENSHOT)
        .exists());
}

#[tokio::test]
async fn test_block_failure_is_isolated() {
    let mut page = FakePage::new(vec![
        post_block(0, "First post survives the failure", "1"),
        post_block(1, "This block detaches mid-scrape", "2"),
        post_block(2, "Third post survives as well", "3"),
    ]);
    page.blocks[1] = None;
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();

    assert_eq!(report.posts.len(), 2);
    assert_eq!(report.blocks[0], BlockOutcome::Accepted);
    assert!(matches!(report.blocks[1], BlockOutcome::Failed(_)));
    assert_eq!(report.blocks[2], BlockOutcome::Accepted);
    assert_eq!(report.posts[1].description, "Third post survives as well");
}

#[tokio::test]
async fn test_block_count_capped() {
    let blocks = (0..30)
        .map(|i| post_block(i, &format!("Announcement number {}", i), &i.to_string()))
        .collect();
    let page = FakePage::new(blocks);
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();

    assert_eq!(report.blocks.len(), 25);
    assert_eq!(report.posts.len(), 25);
    assert_eq!(page.count_calls("snapshot"), 25);
}

#[tokio::test]
async fn test_no_blocks_after_loading() {
    let mut page = FakePage::new(vec![]);
    page.blocks_appear = false;
    let config = ScraperConfig::immediate();

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();

    assert!(report.posts.is_empty());
    assert!(report.low_yield);
    assert_eq!(page.count_calls("wait"), 3);
    assert_eq!(page.count_calls("snapshot"), 0);
}

#[tokio::test]
async fn test_same_page_same_posts() {
    let blocks = vec![
        post_block(0, "Deterministic output for the same page", "1"),
        comment_block(1),
        post_block(2, "Another stable post on the page", "2"),
    ];
    let config = ScraperConfig::immediate();
    let scraper = PageScraper::new(&config, &DisabledResolver);

    let first = scraper
        .run(&FakePage::new(blocks.clone()), &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();
    let second = scraper
        .run(&FakePage::new(blocks), &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();

    let descriptions = |r: &pagefeed::scraper::ScrapeReport| {
        r.posts.iter().map(|p| (p.description.clone(), p.guid.clone())).collect::<Vec<_>>()
    };
    assert_eq!(descriptions(&first), descriptions(&second));
}

#[tokio::test]
async fn test_relative_time_measured_when_block_is_read() {
    let page = FakePage::new(vec![text_block(
        0,
        "Big Club\n3h\nRoad works start on Monday morning",
    )]);
    let config = ScraperConfig {
        scroll_settle: DelayRange::fixed(1500),
        max_scroll_iterations: 1,
        wheel_bursts: 0,
        ..ScraperConfig::immediate()
    };

    let report = PageScraper::new(&config, &DisabledResolver)
        .run(&page, &target(), &DebugArtifacts::disabled())
        .await
        .unwrap();
    let read_at = Utc::now();

    assert_eq!(report.posts.len(), 1);
    let post = &report.posts[0];
    let drift = (read_at - TimeDelta::hours(3)) - post.published_at;
    assert!(
        drift.num_milliseconds().abs() < 1000,
        "published_at drifted {} ms",
        drift.num_milliseconds()
    );

    // No permalink, so the guid carries the capture second
    let (_, secs) = post.guid.rsplit_once('_').unwrap();
    let secs: i64 = secs.parse().unwrap();
    assert!((read_at.timestamp() - secs).abs() <= 1);
}
