use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use portal_auth::{AccessControl, Action, Attribute, Resource, Role, portal_policy};

/// A linear chain `r0 <- r1 <- ... <- r{depth-1}` with one grant per link.
fn chain(depth: usize) -> AccessControl {
    let mut builder = AccessControl::builder();
    for i in 0..depth {
        let role = Role::new(format!("r{i}"));
        builder = builder.grant(
            role.clone(),
            Resource::EVENTS,
            Action::READ_ANY,
            [Attribute::new(format!("a{i}"))],
        );
        if i > 0 {
            builder = builder.extend(role, [Role::new(format!("r{}", i - 1))]);
        }
    }
    builder.finalize().unwrap()
}

fn bench_portal_policy(c: &mut Criterion) {
    let ac = portal_policy().unwrap();
    c.bench_function("portal_policy/admin_read_announcements", |b| {
        b.iter(|| {
            black_box(ac.resolve(
                Some(black_box(&Role::ADMINISTRATOR)),
                &Resource::ANNOUNCEMENTS,
                Action::READ_ANY,
            ))
        })
    });
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("inheritance_chain");
    for depth in [4usize, 16, 64] {
        let ac = chain(depth);
        let leaf = Role::new(format!("r{}", depth - 1));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, leaf| {
            b.iter(|| black_box(ac.resolve(Some(leaf), &Resource::EVENTS, Action::READ_ANY)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_portal_policy, bench_chain_depth);
criterion_main!(benches);
