use postgen_core::settle::{settle3, settle_all, SettleError};
use std::time::Duration;

#[tokio::test]
async fn settle3_isolates_a_panicking_task() {
    let (a, b, c) = settle3(
        async { 1u32 },
        async {
            if true {
                panic!("boom");
            }
            "unreachable"
        },
        async { vec![3u8] },
    )
    .await;

    assert_eq!(a, Ok(1));
    assert_eq!(b, Err(SettleError::Panicked("boom".to_string())));
    assert_eq!(c, Ok(vec![3]));
}

#[tokio::test]
async fn settle3_waits_for_every_task() {
    let (a, b, c) = settle3(
        async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            "slow"
        },
        async { "fast" },
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "medium"
        },
    )
    .await;
    assert_eq!((a, b, c), (Ok("slow"), Ok("fast"), Ok("medium")));
}

#[tokio::test(start_paused = true)]
async fn settle_all_keeps_input_order() {
    let delays = [30u64, 10, 20];
    let results = settle_all(delays.into_iter().map(|ms| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        ms
    }))
    .await;

    let values: Vec<u64> = results.into_iter().map(|r| r.expect("settled")).collect();
    assert_eq!(values, delays);
}

#[tokio::test]
async fn settle_all_reports_formatted_panic_messages() {
    let results = settle_all((0..3).map(|i| async move {
        if i == 1 {
            panic!("task {i} failed");
        }
        i
    }))
    .await;

    assert_eq!(results[0], Ok(0));
    assert_eq!(results[1], Err(SettleError::Panicked("task 1 failed".to_string())));
    assert_eq!(results[2], Ok(2));
}
