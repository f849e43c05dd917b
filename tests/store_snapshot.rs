// tests/store_snapshot.rs
use std::sync::Arc;
use std::thread;

use rand::{rngs::StdRng, Rng, SeedableRng};

use survey_targeting::{Announcement, AnnouncementStore, AnnouncementType};

fn random_list(rng: &mut StdRng, prefix: &str) -> Vec<Announcement> {
    let n = rng.random_range(0..20);
    (0..n)
        .map(|i| {
            let kind = match rng.random_range(0..3) {
                0 => AnnouncementType::Survey,
                1 => AnnouncementType::Fundraising,
                _ => AnnouncementType::Other,
            };
            Announcement::new(kind).with_identifier(format!("{prefix}-{i}"))
        })
        .collect()
}

fn ids(list: &[Announcement]) -> Vec<String> {
    list.iter().filter_map(|a| a.identifier.clone()).collect()
}

#[test]
fn snapshot_is_exactly_the_surveys_in_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let store = AnnouncementStore::new();

    for round in 0..200 {
        let list = random_list(&mut rng, &format!("r{round}"));
        let expected: Vec<String> = ids(
            &list
                .iter()
                .filter(|a| a.announcement_type == AnnouncementType::Survey)
                .cloned()
                .collect::<Vec<_>>(),
        );

        store.replace(list);
        let snap = store.snapshot();
        assert!(snap.iter().all(Announcement::is_survey));
        assert_eq!(ids(&snap), expected);
    }
}

#[test]
fn concurrent_snapshots_never_see_a_mix() {
    // Two generations with disjoint ids and distinct lengths.
    let gen_a: Vec<Announcement> = (0..5)
        .map(|i| Announcement::survey(format!("a-{i}")))
        .collect();
    let gen_b: Vec<Announcement> = (0..9)
        .map(|i| Announcement::survey(format!("b-{i}")))
        .collect();

    let store = Arc::new(AnnouncementStore::new());
    store.replace(gen_a.clone());

    let writer = {
        let store = store.clone();
        let (a, b) = (gen_a.clone(), gen_b.clone());
        thread::spawn(move || {
            for i in 0..2_000 {
                if i % 2 == 0 {
                    store.replace(b.clone());
                } else {
                    store.replace(a.clone());
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let (a, b) = (ids(&gen_a), ids(&gen_b));
            thread::spawn(move || {
                for _ in 0..2_000 {
                    let snap = ids(&store.snapshot());
                    assert!(snap == a || snap == b, "partial snapshot: {snap:?}");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}
