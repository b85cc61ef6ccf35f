// vim: tw=80
//! Verifying several mocks at once

use amock::*;

#[test]
fn all_met() {
    let a = Mock::new("A");
    let b = Mock::new("B");
    a.register("run", || ());
    a.call("run", Vec::new()).unwrap();
    assert!(check_calls([&a, &b]).is_empty());
}

#[test]
fn no_mocks() {
    assert!(check_calls(Vec::<&Mock>::new()).is_empty());
}

#[test]
fn keyed_by_position() {
    let a = Mock::new("A");
    let b = Mock::new("B");
    let c = Mock::new("C");
    for mock in [&a, &b, &c] {
        mock.register("run", || ());
    }
    a.call("run", Vec::new()).unwrap();
    c.call("run", Vec::new()).unwrap();

    let unmet = check_calls([&a, &b, &c]);
    assert_eq!(unmet.keys().copied().collect::<Vec<_>>(), [1]);
    assert_eq!(unmet[&1], [CallReport {
        mock_name: "B".into(),
        method_name: "run".into(),
        expected_calls: 1,
        actual_calls: 0
    }]);
}

#[test]
fn several_unmet() {
    let a = Mock::new("A");
    let b = Mock::new("B");
    a.register("start", || ())
        .register("stop", || ());
    b.register("run", || ());

    let unmet = check_calls([&a, &b]);
    assert_eq!(unmet.len(), 2);
    let methods = unmet[&0].iter()
        .map(|r| r.method_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(methods, ["start", "stop"]);
    assert_eq!(unmet[&1].len(), 1);
}

/// Any `AsRef<Mock>` can be verified alongside plain mocks
#[test]
fn heterogeneous() {
    struct Wrapper {
        mock: Mock
    }
    impl AsRef<Mock> for Wrapper {
        fn as_ref(&self) -> &Mock {
            &self.mock
        }
    }

    let plain = Mock::new("Plain");
    let wrapped = Wrapper { mock: Mock::new("Wrapped") };
    wrapped.mock.register("run", || ());

    let mocks: [&dyn AsRef<Mock>; 2] = [&plain, &wrapped];
    let unmet = check_calls(mocks);
    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[&1][0].mock_name, "Wrapped");
}
