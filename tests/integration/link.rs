use crate::*;

use std::time::Duration;

use camstreamd::link::LinkFlag;
use camstreamd::session::StreamExit;

#[tokio::test]
async fn test_nothing_sent_while_link_down() {
    let (receiver, addr) = bind_receiver().await.unwrap();
    let link = LinkFlag::new(false);

    let running = spawn_streamer(
        ListCamera::new(vec![vec![3u8; 100]]),
        link.clone(),
        addr,
        fast_settings(1024),
    );

    expect_silence(&receiver, Duration::from_millis(100)).await.unwrap();
    assert_eq!(running.stats.snapshot().sessions_opened, 0);

    link.set(true);
    let datagrams = recv_datagrams(&receiver, 1, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(datagrams[0], vec![3u8; 100]);

    let stats = running.stats.clone();
    running.stop().await.unwrap();
    assert_eq!(stats.snapshot().sessions_opened, 1);
}

#[tokio::test]
async fn test_shutdown_while_waiting_for_link() {
    let (_receiver, addr) = bind_receiver().await.unwrap();

    let running = spawn_streamer(
        ListCamera::default(),
        LinkFlag::new(false),
        addr,
        fast_settings(1024),
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    let exit = running.stop().await.unwrap();
    assert!(matches!(exit, StreamExit::Shutdown));
}
