use std::sync::{Arc, Barrier};
use std::thread;

use quill::{MapAccessor, TemplateCache, render};
use quill::cache::{restore, snapshot};

#[test]
fn concurrent_first_access_shares_one_compilation() {
    let cache = TemplateCache::new();
    let barrier = Barrier::new(8);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_or_compile("Hello @name").unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for pair in results.windows(2) {
        assert!(Arc::ptr_eq(&pair[0], &pair[1]));
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn distinct_texts_get_distinct_entries() {
    let cache = TemplateCache::new();
    let a = cache.get_or_compile("a").unwrap();
    let b = cache.get_or_compile("b").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[test]
fn cached_templates_render_across_threads() {
    let cache = Arc::new(TemplateCache::new());
    let template = cache.get_or_compile("@greeting, @name!").unwrap();

    let outputs: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ["Ada", "Bo"]
            .into_iter()
            .map(|name| {
                let template = Arc::clone(&template);
                scope.spawn(move || {
                    let scope = MapAccessor::new().with("greeting", "Hi").with("name", name);
                    render(&template, &scope).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(outputs.contains(&"Hi, Ada!".to_string()));
    assert!(outputs.contains(&"Hi, Bo!".to_string()));
}

#[test]
fn snapshot_round_trips_a_compiled_template() {
    let template = quill::compile("@if(ok){@for(x, i in xs){@i=@x;}}else{-}").unwrap();
    let bytes = snapshot(&template).unwrap();
    let restored = restore(&bytes).unwrap();
    assert_eq!(template, restored);
}

#[test]
fn restore_rejects_garbage() {
    let err = restore(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
    assert!(err.contains("template decode failed"), "message: {err}");
}
