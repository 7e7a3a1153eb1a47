use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

fn bench_login(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let svc = AuthService::new(repo, AuthConfig::new("bench-secret"));

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput {
        email: "bench@example.com".into(),
        full_name: "Bench Buyer".into(),
        password: "Benchmark1".into(),
    }))
    .unwrap();

    c.bench_function("auth_login_argon2_jwt", |b| {
        b.iter(|| {
            rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() }))
                .unwrap();
        });
    });
}

fn bench_verify(c: &mut Criterion) {
    let svc = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::new("bench-secret"));
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput {
        email: "verify@example.com".into(),
        full_name: "Verify".into(),
        password: "Benchmark1".into(),
    }))
    .unwrap();
    let session = rt
        .block_on(svc.login(LoginInput { email: "verify@example.com".into(), password: "Benchmark1".into() }))
        .unwrap();

    c.bench_function("auth_verify_token", |b| {
        b.iter(|| svc.verify_token(&session.access_token).unwrap());
    });
}

criterion_group!(benches, bench_login, bench_verify);
criterion_main!(benches);
