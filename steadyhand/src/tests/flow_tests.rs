//! End-to-end flow runs against a scripted page, checking the exact action
//! sequence each flow performs.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{init_tracing, FakeDriver, FakeElement};
use crate::config::{
    Credentials, FilePickerConfig, GroupwareConfig, GroupwareLocators, MenuItem, ProductEdit,
    ProductLocators, ProductUpdateConfig, ReviewConfig, Timeouts,
};
use crate::errors::AutomationError;
use crate::flows::{file_picker, groupware, product_update, review};

fn loc(s: &str) -> crate::locator::Locator {
    s.parse().unwrap()
}

fn timeouts() -> Timeouts {
    Timeouts {
        wait: Duration::from_secs(2),
        poll_interval: Duration::from_millis(100),
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: "hunter2".to_string(),
    }
}

fn groupware_config() -> GroupwareConfig {
    GroupwareConfig {
        url: "https://groupware.example.com/login".to_string(),
        credentials: credentials(),
        locators: GroupwareLocators {
            username: loc("id:user"),
            password: loc("id:pass"),
            login_button: loc("xpath://button[text()='Login']"),
            post_login: loc("link:Dashboard"),
        },
        menu: vec![
            MenuItem {
                locator: loc("link:Dashboard"),
                ready: Some(loc("css:#dashboard")),
            },
            MenuItem {
                locator: loc("xpath://a[@href='/reports']"),
                ready: None,
            },
        ],
        observe: Duration::from_secs(1),
        timeouts: timeouts(),
    }
}

fn groupware_page() -> FakeDriver {
    FakeDriver::new()
        .with_present("id:user")
        .with_present("id:pass")
        .with_present("xpath://button[text()='Login']")
        .with(
            "link:Dashboard",
            FakeElement {
                appears_after: 2,
                ..Default::default()
            },
        )
        .with_present("css:#dashboard")
        .with_present("xpath://a[@href='/reports']")
}

#[tokio::test(start_paused = true)]
async fn test_groupware_flow_sequence() {
    init_tracing();
    let driver = groupware_page();
    groupware::run(&driver, &groupware_config(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "navigate https://groupware.example.com/login",
            "type id:user alice",
            "type id:pass hunter2",
            "click xpath://button[text()='Login']",
            "click link:Dashboard",
            "click xpath://a[@href='/reports']",
            "quit",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_groupware_missing_post_login_times_out_and_quits() {
    init_tracing();
    let driver = FakeDriver::new()
        .with_present("id:user")
        .with_present("id:pass")
        .with_present("xpath://button[text()='Login']");

    let err = groupware::run(&driver, &groupware_config(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        AutomationError::Timeout(msg) => assert!(msg.contains("link:Dashboard")),
        e => panic!("Expected a Timeout error, but got {e:?}"),
    }
    assert_eq!(driver.log().last().map(String::as_str), Some("quit"));
}

#[tokio::test(start_paused = true)]
async fn test_groupware_cancelled_run_stops_early() {
    init_tracing();
    let driver = groupware_page();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = groupware::run(&driver, &groupware_config(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::Cancelled(_)));
    assert_eq!(
        driver.log(),
        vec!["navigate https://groupware.example.com/login", "quit"]
    );
}

fn product_config() -> ProductUpdateConfig {
    ProductUpdateConfig {
        url: "https://shop.example.com/admin/".to_string(),
        credentials: credentials(),
        product: ProductEdit {
            identifier: "Sample Mug".to_string(),
            description: "Updated description".to_string(),
            price: "12345".to_string(),
        },
        locators: ProductLocators {
            login_frame: Some(loc("id:login_frame")),
            username: loc("id:mall_id"),
            password: loc("id:userpasswd"),
            login_button: loc("xpath://button[@type='submit']"),
            products_menu: loc("link:Products"),
            product_list: loc("link:Product List"),
            edit_button: loc("xpath://td[contains(text(),'{product}')]/following-sibling::td/a"),
            edit_frame: Some(loc("id:detail_frame")),
            description: loc("name:product_description"),
            price: loc("id:price"),
            save: loc("css:#save"),
            saved: Some(loc("css:.saved")),
        },
        observe: Duration::from_secs(1),
        timeouts: timeouts(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_product_update_skips_missing_login_frame() {
    init_tracing();
    let driver = FakeDriver::new()
        .with_present("id:mall_id")
        .with_present("id:userpasswd")
        .with_present("xpath://button[@type='submit']")
        .with_present("link:Products")
        .with_present("link:Product List")
        .with_present("tag:body")
        .with_present("xpath://td[contains(text(),'Sample Mug')]/following-sibling::td/a")
        .with_present("id:detail_frame")
        .with_present("name:product_description")
        .with_present("id:price")
        .with_present("css:#save")
        .with(
            "css:.saved",
            FakeElement {
                appears_after: 3,
                ..Default::default()
            },
        );

    product_update::run(&driver, &product_config(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "navigate https://shop.example.com/admin/",
            "clear id:mall_id",
            "type id:mall_id alice",
            "clear id:userpasswd",
            "type id:userpasswd hunter2",
            "click xpath://button[@type='submit']",
            "default content",
            "click link:Products",
            "click link:Product List",
            "click xpath://td[contains(text(),'Sample Mug')]/following-sibling::td/a",
            "frame id:detail_frame",
            "clear name:product_description",
            "type name:product_description Updated description",
            "clear id:price",
            "type id:price 12345",
            "click css:#save",
            "quit",
        ]
    );
    // the login frame was polled for the whole budget before being skipped
    assert_eq!(driver.lookups("id:login_frame"), 21);
}

#[tokio::test(start_paused = true)]
async fn test_product_update_missing_edit_frame_is_fatal() {
    init_tracing();
    let mut config = product_config();
    config.locators.login_frame = None;
    let driver = FakeDriver::new()
        .with_present("id:mall_id")
        .with_present("id:userpasswd")
        .with_present("xpath://button[@type='submit']")
        .with_present("link:Products")
        .with_present("link:Product List")
        .with_present("tag:body")
        .with_present("xpath://td[contains(text(),'Sample Mug')]/following-sibling::td/a");

    let err = product_update::run(&driver, &config, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::Timeout(_)));
    assert_eq!(driver.log().last().map(String::as_str), Some("quit"));
}

#[tokio::test(start_paused = true)]
async fn test_review_waits_for_document_then_holds() {
    init_tracing();
    let driver = FakeDriver::new().with_ready_after(3);
    let config = ReviewConfig {
        url: "https://docs.example.com/guide-v3".to_string(),
        review: Duration::from_secs(10),
        timeouts: timeouts(),
    };

    let start = tokio::time::Instant::now();
    review::run(&driver, &config, &CancellationToken::new())
        .await
        .unwrap();

    // two 100ms polls before "complete", then the 10s review
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(10_200));
    assert!(elapsed < Duration::from_millis(10_400));
    assert_eq!(
        driver.log(),
        vec!["navigate https://docs.example.com/guide-v3", "quit"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_file_picker_key_sequence() {
    init_tracing();
    let driver = FakeDriver::new();
    let config = FilePickerConfig {
        open_hotkey: "ctrl+o".to_string(),
        presses: 3,
    };

    file_picker::run(&driver, &config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        driver.log(),
        vec![
            "hotkey ctrl+o",
            "key down",
            "key down",
            "key down",
            "key enter",
            "quit",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_file_picker_cancel_during_grace_sends_nothing() {
    init_tracing();
    let driver = FakeDriver::new();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = file_picker::run(&driver, &FilePickerConfig::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::Cancelled(_)));
    assert_eq!(driver.log(), vec!["quit"]);
}
