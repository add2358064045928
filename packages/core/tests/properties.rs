//! End-to-end checks of the tree invariants against the raw store.

use janosh_core::{
    path, Command, Context, Error, Event, EventRecorder, KvStore, MemoryStore, NoVisitor, Path,
    Reply, Source, Value,
};

fn context() -> (Context, MemoryStore) {
    let store = MemoryStore::new();
    (Context::new(store.clone()), store)
}

fn numbers(values: &[i64]) -> Source {
    Source::array(values.iter().map(|v| Source::from(*v)))
}

enum Open {
    Array(Vec<Source>),
    Object(Vec<(String, Source)>),
}

/// Rebuild a `Source` from traversal events so reads can be compared with
/// what was loaded.
fn rebuild(events: &[Event]) -> Source {
    let mut stack: Vec<(String, Open)> = Vec::new();
    let mut done = None;

    let mut attach = |stack: &mut Vec<(String, Open)>, name: String, value: Source| {
        match stack.last_mut() {
            Some((_, Open::Array(items))) => items.push(value),
            Some((_, Open::Object(members))) => members.push((name, value)),
            None => done = Some(value),
        }
    };

    for event in events {
        match event {
            Event::BeginArray { path, .. } => stack.push((name_of(path), Open::Array(Vec::new()))),
            Event::BeginObject { path, .. } => {
                stack.push((name_of(path), Open::Object(Vec::new())))
            }
            Event::EndArray { .. } | Event::EndObject { .. } => {
                let (name, open) = stack.pop().expect("balanced events");
                let value = match open {
                    Open::Array(items) => Source::Array(items),
                    Open::Object(members) => Source::Object(members),
                };
                attach(&mut stack, name, value);
            }
            Event::Record { path, value, .. } => {
                attach(&mut stack, name_of(path), Source::Scalar(value.clone()))
            }
            Event::Begin | Event::Close => {}
        }
    }
    done.expect("a complete document")
}

fn name_of(path: &Path) -> String {
    path.last().map(|c| c.to_string()).unwrap_or_default()
}

fn read(ctx: &Context, path: &Path) -> Source {
    let mut events = EventRecorder::new();
    Command::Get {
        path: path.clone(),
        nested: false,
    }
    .execute(ctx, &mut events)
    .unwrap();
    rebuild(&events.events)
}

/// Count the direct children of `dir` by scanning raw keys.
fn physical_children(store: &MemoryStore, dir: &Path) -> usize {
    store
        .entries()
        .unwrap()
        .iter()
        .filter_map(|(k, _)| Path::from_key(k).ok())
        .filter(|p| p.parent().is_some_and(|parent| parent.same_node(dir)))
        .count()
}

/// Every stored container declares exactly its physical child count.
fn assert_sizes_match(store: &MemoryStore) {
    for (key, bytes) in store.entries().unwrap() {
        let path = Path::from_key(&key).unwrap();
        let value = Value::decode(&bytes, false, false).unwrap();
        if let Some(size) = value.size() {
            assert_eq!(
                size,
                physical_children(store, &path),
                "declared size of {} disagrees with the store",
                path
            );
        }
    }
}

fn document() -> Source {
    Source::object([
        (
            "users",
            Source::array([
                Source::object([("name", Source::from("ada")), ("admin", Source::from(true))]),
                Source::object([("name", Source::from("bob")), ("admin", Source::from(false))]),
            ]),
        ),
        ("version", Source::from(3i64)),
        ("tags", numbers(&[5, 6, 7])),
        ("empty", Source::Object(Vec::new())),
        ("nothing", Source::from(Value::Null)),
    ])
}

/// Object members read back in key order; sort the expectation the same way.
fn sorted(source: Source) -> Source {
    match source {
        Source::Object(mut members) => {
            members.sort_by(|a, b| a.0.cmp(&b.0));
            Source::Object(members.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Source::Array(items) => Source::Array(items.into_iter().map(sorted).collect()),
        scalar => scalar,
    }
}

#[test]
fn round_trip_preserves_shape() {
    let (ctx, _) = context();
    Command::Load {
        dest: Path::root(),
        source: document(),
    }
    .execute(&ctx, &mut NoVisitor)
    .unwrap();
    assert_eq!(read(&ctx, &Path::root()), sorted(document()));
    assert_eq!(read(&ctx, &path!("/tags")), numbers(&[5, 6, 7]));
}

#[test]
fn sizes_follow_every_mutation() {
    let (ctx, store) = context();
    let tree = ctx.tree();
    tree.load(&Path::root(), &document()).unwrap();
    assert_sizes_match(&store);

    tree.add(&path!("/users/#2"), &Value::from("carol")).unwrap();
    tree.make_object(&path!("/empty/inner/.")).unwrap();
    tree.remove_path(&path!("/users/#0")).unwrap();
    tree.copy(&path!("/users"), &path!("/backup")).unwrap();
    let mut tags = ctx.record(path!("/tags"));
    tree.append(&mut tags, &path!("/backup")).unwrap();
    tree.move_to(&path!("/version"), &path!("/empty/version")).unwrap();
    tree.shift(&path!("/backup/#0"), &path!("/backup/#4")).unwrap();
    assert_sizes_match(&store);
    assert!(tree.check(&Path::root()).is_ok());

    assert_eq!(tree.size(&path!("/backup")).unwrap(), 5);
    assert_eq!(tree.size(&path!("/empty")).unwrap(), 2);
}

#[test]
fn remove_keeps_arrays_dense() {
    let (ctx, store) = context();
    let tree = ctx.tree();
    tree.load(&Path::root(), &Source::object([("a", numbers(&[0, 1, 2, 3, 4, 5]))]))
        .unwrap();
    for path in ["/a/#4", "/a/#0", "/a/#2"] {
        tree.remove_path(&Path::parse(path).unwrap()).unwrap();
    }
    assert_eq!(read(&ctx, &path!("/a")), numbers(&[1, 2, 5]));
    let indices: Vec<usize> = store
        .entries()
        .unwrap()
        .iter()
        .filter_map(|(k, _)| Path::from_key(k).ok())
        .filter_map(|p| p.index())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn bounds_allow_exactly_append() {
    let (ctx, _) = context();
    let tree = ctx.tree();
    tree.load(&Path::root(), &Source::object([("a", numbers(&[1, 2]))]))
        .unwrap();

    let err = tree.add(&path!("/a/#3"), &Value::from(0i64)).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { index: 3, size: 2, .. }));
    let err = tree.make_array(&path!("/a/#3/.")).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { .. }));

    tree.make_array(&path!("/a/#2/.")).unwrap();
    tree.add(&path!("/a/#3"), &Value::from(0i64)).unwrap();
    assert_eq!(tree.size(&path!("/a")).unwrap(), 4);
}

#[test]
fn shift_is_remove_then_insert() {
    let original = [10, 11, 12, 13, 14];
    for i in 0..original.len() {
        for j in 0..original.len() {
            let (ctx, _) = context();
            let tree = ctx.tree();
            tree.load(&Path::root(), &Source::object([("a", numbers(&original))]))
                .unwrap();
            let src = path!("/a").with_index(i).unwrap();
            let dest = path!("/a").with_index(j).unwrap();
            tree.shift(&src, &dest).unwrap();

            let mut expected = original.to_vec();
            let moved = expected.remove(i);
            expected.insert(j, moved);
            assert_eq!(
                read(&ctx, &path!("/a")),
                numbers(&expected),
                "shift #{} -> #{}",
                i,
                j
            );
        }
    }
}

#[test]
fn ancestors_cannot_be_copied_into_descendants() {
    let (ctx, store) = context();
    let tree = ctx.tree();
    tree.load(&Path::root(), &document()).unwrap();
    let before = store.entries().unwrap();

    let mut users = ctx.record(path!("/users"));
    assert!(matches!(
        tree.append(&mut users, &path!("/users/#0")),
        Err(Error::Cycle { .. })
    ));
    assert!(matches!(
        tree.copy(&path!("/users"), &path!("/users/#1/copy")),
        Err(Error::Cycle { .. })
    ));
    assert!(matches!(
        tree.copy(&Path::root(), &path!("/empty")),
        Err(Error::Cycle { .. })
    ));
    assert_eq!(store.entries().unwrap(), before);
}

#[test]
fn remove_then_get_scenario() {
    let (ctx, _) = context();
    Command::Load {
        dest: Path::root(),
        source: Source::object([("a", numbers(&[1, 2, 3]))]),
    }
    .execute(&ctx, &mut NoVisitor)
    .unwrap();
    Command::Remove {
        path: path!("/a/#1"),
    }
    .execute(&ctx, &mut NoVisitor)
    .unwrap();

    assert_eq!(read(&ctx, &path!("/a")), numbers(&[1, 3]));
    assert_eq!(
        Command::Size { path: path!("/a") }
            .execute(&ctx, &mut NoVisitor)
            .unwrap(),
        Reply::Size(2)
    );
}

#[test]
fn shift_scenario() {
    let (ctx, store) = context();
    let commands = [
        Command::MakeArray { path: path!("/x") },
        Command::Add {
            path: path!("/x/#0"),
            value: Value::from("v"),
        },
        Command::Add {
            path: path!("/x/#1"),
            value: Value::from("w"),
        },
        Command::Shift {
            src: path!("/x/#0"),
            dest: path!("/x/#1"),
        },
    ];
    for command in &commands {
        command.execute(&ctx, &mut NoVisitor).unwrap();
    }
    assert_eq!(
        read(&ctx, &path!("/x")),
        Source::array([Source::from("w"), Source::from("v")])
    );
    assert!(store
        .get(path!("/x/#1").key())
        .unwrap()
        .is_some_and(|v| v == Value::from("v").encode()));
}
