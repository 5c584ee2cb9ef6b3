use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::domain::{AuthUser, LoginInput};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::authz::Role;
use service::password::hash_password;

fn bench_auth(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let user = AuthUser {
        id: uuid::Uuid::new_v4(),
        username: "bench".into(),
        email: "bench@club.example.org".into(),
        full_name: "Bench".into(),
        active: true,
        roles: vec![Role::Editor],
        last_login_at: None,
    };
    repo.insert_user(user, hash_password("Benchmark1").unwrap());
    let svc = AuthService::new(
        repo,
        AuthConfig { jwt_secret: "bench-secret-0123456789".into(), issuer: "bench".into(), access_ttl_secs: 3600, refresh_ttl_secs: 86400 },
    );
    let rt = tokio::runtime::Runtime::new().unwrap();
    let login = || LoginInput { username_or_email: "bench".into(), password: "Benchmark1".into() };

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| rt.block_on(svc.login(login())).unwrap());
    });

    let session = rt.block_on(svc.login(login())).unwrap();
    c.bench_function("auth_authenticate_token", |b| {
        b.iter(|| rt.block_on(svc.authenticate(&session.access_token)).unwrap());
    });
}

criterion_group!(benches, bench_auth);
criterion_main!(benches);
