//! End-to-end creation through `DatasetProvider` against the in-memory backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use libdataset::{
    CreateArgs, DatasetError, DatasetKind, MemoryBackend, PropertyValue, property::TunableValue,
};

use crate::common::{in_pool, init_logger, pooled, provider, seeded_backend};

/// Discriminant of an error, for table-driven expectations.
fn kind_of(err: &DatasetError) -> &'static str {
    match err {
        DatasetError::MissingArgument(_) => "MissingArgument",
        DatasetError::MissingOrInvalidArgument(_) => "MissingOrInvalidArgument",
        DatasetError::InvalidArgument(_) => "InvalidArgument",
        DatasetError::AlreadyExists(_) => "AlreadyExists",
        DatasetError::NotFound(_) => "NotFound",
        DatasetError::Backend(_) => "Backend",
        DatasetError::Transport(_) => "Transport",
        DatasetError::Internal(_) => "Internal",
    }
}

fn args(name: &str, kind: &str, volsize: Option<i64>, props: &[(&str, PropertyValue)]) -> CreateArgs {
    CreateArgs {
        name: name.to_owned(),
        kind: kind.to_owned(),
        volsize,
        properties: (!props.is_empty()).then(|| {
            props
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        }),
    }
}

#[test]
fn creation_table() {
    init_logger();

    let fs = "filesystem";
    let vol = "volume";
    let foo_bar = || ("foo", PropertyValue::from("bar"));
    let cases: Vec<(CreateArgs, Option<&str>)> = vec![
        (args("", fs, None, &[]), Some("MissingArgument")),
        (args("fs1", fs, None, &[]), Some("AlreadyExists")),
        (args("fs1/~1", fs, None, &[]), Some("InvalidArgument")),
        (args("fsbadprop", fs, None, &[foo_bar()]), Some("InvalidArgument")),
        (args("foobar/fs1", fs, None, &[]), Some("NotFound")),
        (args("fscreatebad", "asdf", None, &[]), Some("MissingOrInvalidArgument")),
        (args("fscreate1", fs, None, &[]), None),
        (args("fscreate2", fs, None, &[("foo:bar", "baz".into())]), None),
        (
            args("", vol, None, &[("volsize", PropertyValue::Int(8192))]),
            Some("MissingArgument"),
        ),
        (args("vol1", vol, None, &[]), Some("MissingOrInvalidArgument")),
        (args("vol2", vol, Some(0), &[]), Some("MissingOrInvalidArgument")),
        (args("foovol/vol1", vol, Some(8192), &[]), Some("NotFound")),
        (args("volbadprop", vol, Some(8192), &[foo_bar()]), Some("InvalidArgument")),
        (args("vol3", vol, Some(8192), &[]), None),
        (args("fsvol/vol1", vol, Some(8192), &[]), Some("AlreadyExists")),
        (
            args("vol4", vol, Some(1024), &[("volblocksize", PropertyValue::Int(1024))]),
            None,
        ),
    ];

    let provider = provider(seeded_backend());

    for (case, expected) in cases {
        let case = in_pool(case);
        let label = format!("{case:?}");
        match (provider.create(&case), expected) {
            (Ok(result), None) => {
                let ds = result.dataset;
                assert_eq!(ds.name, case.name, "{label}");
                assert_eq!(ds.kind.as_str(), case.kind, "{label}");
                if let Some(props) = &case.properties {
                    if let Some(v) = props.get("foo:bar") {
                        assert_eq!(ds.properties.user_defined.get("foo:bar"), Some(v), "{label}");
                    }
                }
                if ds.kind == DatasetKind::Volume {
                    assert_eq!(ds.volsize, case.volsize.map(|s| s as u64), "{label}");
                }
            }
            (Err(err), Some(kind)) => assert_eq!(kind_of(&err), kind, "{label}: {err}"),
            (other, expected) => panic!("{label}: got {other:?}, expected {expected:?}"),
        }
    }
}

#[test]
fn empty_name_reports_name_field() {
    let provider = provider(seeded_backend());
    let err = provider.create(&CreateArgs::filesystem("")).unwrap_err();
    assert_eq!(err, DatasetError::MissingArgument("name".into()));
    assert_eq!(err.to_string(), "missing arg: name");
}

#[test]
fn existing_name_is_already_exists() {
    let provider = provider(seeded_backend());
    let err = provider
        .create(&CreateArgs::filesystem(pooled("fs1")))
        .unwrap_err();
    assert_eq!(err, DatasetError::AlreadyExists(pooled("fs1")));
}

#[test]
fn filesystem_round_trip() {
    let provider = provider(seeded_backend());
    let result = provider
        .create(&CreateArgs::filesystem(pooled("fscreate1")))
        .unwrap();
    assert_eq!(result.dataset.name, "tank/fscreate1");
    assert_eq!(result.dataset.kind, DatasetKind::Filesystem);
    assert!(result.dataset.properties.user_defined.is_empty());
}

#[test]
fn annotation_is_returned_unchanged() {
    let provider = provider(seeded_backend());
    let result = provider
        .create(&CreateArgs::filesystem(pooled("fs2")).with_property("foo:bar", "baz"))
        .unwrap();
    assert_eq!(
        result.dataset.properties.user_defined["foo:bar"],
        PropertyValue::Text("baz".into())
    );

    let result = provider
        .create(
            &CreateArgs::volume(pooled("annotated"), 16384)
                .with_property("com.example:tier", PropertyValue::Int(2)),
        )
        .unwrap();
    assert_eq!(
        result.dataset.properties.user_defined["com.example:tier"],
        PropertyValue::Int(2)
    );
}

#[test]
fn volume_without_size_is_rejected() {
    let provider = provider(seeded_backend());
    let args = CreateArgs {
        volsize: None,
        ..CreateArgs::volume(pooled("vol1"), 0)
    };
    assert_eq!(
        provider.create(&args).unwrap_err(),
        DatasetError::MissingOrInvalidArgument("volsize".into())
    );
}

#[test]
fn volume_with_block_size() {
    let provider = provider(seeded_backend());
    let result = provider
        .create(
            &CreateArgs::volume(pooled("vol4"), 1024)
                .with_property("volblocksize", PropertyValue::Int(1024)),
        )
        .unwrap();
    assert_eq!(result.dataset.kind, DatasetKind::Volume);
    assert_eq!(result.dataset.volsize, Some(1024));
    assert_eq!(
        result.dataset.properties.tunables["volblocksize"],
        TunableValue::Size(1024)
    );
}

#[test]
fn backend_block_size_check_maps_to_invalid_argument() {
    // 1024 is not a multiple of the backend's default 8K block size.
    let provider = provider(seeded_backend());
    let err = provider
        .create(&CreateArgs::volume(pooled("small"), 1024))
        .unwrap_err();
    assert!(matches!(err, DatasetError::InvalidArgument(_)), "{err}");
}

#[test]
fn unmapped_backend_errno_passes_through() {
    let provider = provider(seeded_backend());
    let err = provider
        .create(&CreateArgs::filesystem(pooled("fsvol/vol1/child")))
        .unwrap_err();
    assert!(matches!(err, DatasetError::Backend(msg) if msg.contains("Not a directory")));
}

#[test]
fn rejected_requests_leave_backend_untouched() {
    let backend = seeded_backend();
    let before = backend.len();
    let provider = provider(Arc::clone(&backend));
    let bad = [
        CreateArgs::filesystem(""),
        CreateArgs::volume(pooled("v"), -1),
        CreateArgs::filesystem(pooled("p")).with_property("bogus", true),
        CreateArgs {
            kind: "snapshot".into(),
            ..CreateArgs::filesystem(pooled("s"))
        },
    ];
    for args in &bad {
        for _ in 0..3 {
            assert!(provider.create(args).is_err());
        }
    }
    assert_eq!(backend.len(), before);
}

#[test]
fn concurrent_creators_see_one_success() {
    init_logger();

    let backend = Arc::new(MemoryBackend::new());
    backend.add_pool("tank").unwrap();
    let provider = provider(backend);
    let args = CreateArgs::filesystem("tank/race");

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| provider.create(&args)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("creator thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|e| *e == DatasetError::AlreadyExists("tank/race".into()))
    );
}
