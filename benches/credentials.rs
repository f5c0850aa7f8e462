use criterion::{criterion_group, criterion_main, Criterion};
use dudemy_core::{DidResolver, IdentityAgent, InstructorCredential};
use std::sync::Arc;

fn bench_credentials(c: &mut Criterion) {
    let mut agent = IdentityAgent::new(Arc::new(DidResolver::new()));
    let did = agent.connect();

    c.bench_function("issue_instructor_credential", |b| {
        b.iter(|| InstructorCredential::issue(&agent, &did, "Alice", "alice@example.com", "TeacherCredential"))
    });

    let issued = InstructorCredential::issue(&agent, &did, "Alice", "alice@example.com", "TeacherCredential")
        .expect("issue");
    c.bench_function("verify_instructor_credential", |b| {
        b.iter(|| InstructorCredential::from_jwt(issued.jwt()))
    });

    c.bench_function("resolve_did_key", |b| b.iter(|| did.verifying_key()));
}

criterion_group!(benches, bench_credentials);
criterion_main!(benches);
