use std::sync::Arc;

use chrono::{TimeZone, Utc};
use into_the_wild_registration::error::RegistrationError;
use into_the_wild_registration::memory::{
    CollectingSink, FailingSink, InMemoryStore, MemoryProofStore,
};
use into_the_wild_registration::model::{
    IdKind, PaymentStatus, ProofStatus, RegistrationForm, TentKind, TrekEvent, UserId,
};
use into_the_wild_registration::notify::{NotificationTemplates, Notifier};
use into_the_wild_registration::payment::PaymentProofUpload;
use into_the_wild_registration::store::TentStore;
use into_the_wild_registration::{RegistrationService, TentService};

fn trek(id: i32, max_participants: Option<i32>) -> TrekEvent {
    TrekEvent {
        id,
        name: format!("Trek {id}"),
        starts_at: Utc.with_ymd_and_hms(2026, 11, 14, 6, 0, 0).unwrap(),
        max_participants,
        cost: 2500.0,
        requires_id_proof: false,
    }
}

fn form() -> RegistrationForm {
    RegistrationForm {
        indemnity_accepted: true,
        registrant_name: "Asha Rao".to_owned(),
        registrant_phone: "9876543210".to_owned(),
        is_driver: false,
        offered_seats: None,
    }
}

fn user(name: &str) -> Option<UserId> {
    Some(UserId(name.to_owned()))
}

struct Fixture {
    store: Arc<InMemoryStore>,
    proofs: Arc<MemoryProofStore>,
    sink: Arc<CollectingSink>,
    service: RegistrationService,
    tents: TentService,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let proofs = Arc::new(MemoryProofStore::new("https://proofs.example.com"));
    let sink = Arc::new(CollectingSink::new());
    let notifier = Notifier::new(
        NotificationTemplates::default(),
        vec!["email".to_owned()],
        sink.clone(),
    );
    let service = RegistrationService::new(store.clone(), proofs.clone(), notifier.clone());
    let tents = TentService::new(store.clone(), store.clone(), notifier);
    Fixture {
        store,
        proofs,
        sink,
        service,
        tents,
    }
}

#[tokio::test]
async fn registering_twice_succeeds_once() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(10)));

    let first = fx.service.register(user("asha"), 1, form()).await.unwrap();
    assert_eq!(first.status, PaymentStatus::Pending);

    let second = fx.service.register(user("asha"), 1, form()).await;
    assert!(matches!(
        second,
        Err(RegistrationError::AlreadyRegistered)
    ));
}

#[tokio::test]
async fn capacity_boundary_is_exact() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(3)));

    for name in ["u1", "u2"] {
        fx.service.register(user(name), 1, form()).await.unwrap();
    }

    // N-1 registered: one seat left.
    fx.service.register(user("u3"), 1, form()).await.unwrap();

    let over = fx.service.register(user("u4"), 1, form()).await;
    assert!(matches!(over, Err(RegistrationError::TrekFull)));

    let availability = fx.service.availability(1).await.unwrap();
    assert_eq!(availability.registered, 3);
    assert!(!availability.has_space);
}

#[tokio::test]
async fn cancellation_frees_capacity() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(2)));

    let first = fx.service.register(user("u1"), 1, form()).await.unwrap();
    fx.service.register(user("u2"), 1, form()).await.unwrap();
    assert!(matches!(
        fx.service.register(user("u3"), 1, form()).await,
        Err(RegistrationError::TrekFull)
    ));

    let cancelled = fx.service.cancel(user("u1"), first.id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    fx.service.register(user("u3"), 1, form()).await.unwrap();
}

#[tokio::test]
async fn id_requirements_must_all_be_approved() {
    let fx = fixture();
    let mut event = trek(1, Some(10));
    event.requires_id_proof = true;
    fx.store.insert_trek(event);
    fx.store.require_id(1, IdKind("aadhaar".to_owned()));
    fx.store.require_id(1, IdKind("passport".to_owned()));
    fx.store.set_id_proof(
        UserId("asha".to_owned()),
        IdKind("aadhaar".to_owned()),
        ProofStatus::Approved,
    );
    // A pending proof for the second kind does not count.
    fx.store.set_id_proof(
        UserId("asha".to_owned()),
        IdKind("passport".to_owned()),
        ProofStatus::Pending,
    );

    let denied = fx.service.register(user("asha"), 1, form()).await;
    match denied {
        Err(RegistrationError::MissingApprovedId(missing)) => {
            assert_eq!(missing, vec![IdKind("passport".to_owned())]);
        }
        other => panic!("expected MissingApprovedId, got {other:?}"),
    }

    fx.store.set_id_proof(
        UserId("asha".to_owned()),
        IdKind("passport".to_owned()),
        ProofStatus::Approved,
    );
    fx.service.register(user("asha"), 1, form()).await.unwrap();
}

#[tokio::test]
async fn proof_upload_transitions_status_exactly_once() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(10)));
    let registration = fx.service.register(user("asha"), 1, form()).await.unwrap();

    let upload = PaymentProofUpload {
        file_name: "receipt.png".to_owned(),
        bytes: vec![1, 2, 3],
        payer_name: "Asha Rao".to_owned(),
        payer_phone: "9876543210".to_owned(),
    };
    let updated = fx
        .service
        .upload_payment_proof(user("asha"), registration.id, upload.clone())
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::ProofUploaded);
    let first_reference = updated.proof_reference.clone().unwrap();
    assert!(first_reference.starts_with("https://proofs.example.com/asha/1/"));

    // Re-uploading replaces the reference on the same row.
    let again = fx
        .service
        .upload_payment_proof(
            user("asha"),
            registration.id,
            PaymentProofUpload {
                file_name: "receipt-2.png".to_owned(),
                ..upload
            },
        )
        .await
        .unwrap();
    assert_eq!(again.id, updated.id);
    assert_eq!(again.status, PaymentStatus::ProofUploaded);
    assert_ne!(again.proof_reference.unwrap(), first_reference);
    assert_eq!(fx.service.availability(1).await.unwrap().registered, 1);
    assert_eq!(fx.proofs.object_count(), 2);
}

#[tokio::test]
async fn two_seat_scenario_end_to_end() {
    let fx = fixture();
    fx.store.insert_trek(trek(7, Some(2)));

    let first = fx.service.register(user("u1"), 7, form()).await.unwrap();
    assert_eq!(fx.service.availability(7).await.unwrap().registered, 1);

    fx.service.register(user("u2"), 7, form()).await.unwrap();
    assert_eq!(fx.service.availability(7).await.unwrap().registered, 2);

    assert!(matches!(
        fx.service.register(user("u3"), 7, form()).await,
        Err(RegistrationError::TrekFull)
    ));

    fx.service.cancel(user("u1"), first.id).await.unwrap();
    fx.service.register(user("u3"), 7, form()).await.unwrap();
    assert_eq!(fx.service.availability(7).await.unwrap().registered, 2);
}

#[tokio::test]
async fn eligibility_checks_short_circuit_in_order() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(10)));

    // Unauthenticated wins over everything else.
    let mut bad_form = form();
    bad_form.indemnity_accepted = false;
    bad_form.registrant_name = String::new();
    assert!(matches!(
        fx.service.register(None, 1, bad_form.clone()).await,
        Err(RegistrationError::AuthRequired)
    ));

    assert!(matches!(
        fx.service.register(user("asha"), 1, bad_form.clone()).await,
        Err(RegistrationError::IndemnityRequired)
    ));

    bad_form.indemnity_accepted = true;
    assert!(matches!(
        fx.service.register(user("asha"), 1, bad_form).await,
        Err(RegistrationError::MissingContactDetails)
    ));

    let mut blank_phone = form();
    blank_phone.registrant_phone = "   ".to_owned();
    assert!(matches!(
        fx.service.register(user("asha"), 1, blank_phone).await,
        Err(RegistrationError::MissingContactDetails)
    ));

    assert!(matches!(
        fx.service.register(user("asha"), 99, form()).await,
        Err(RegistrationError::TrekNotLoaded)
    ));
}

#[tokio::test]
async fn unset_or_zero_capacity_fails_closed() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, None));
    fx.store.insert_trek(trek(2, Some(0)));

    for trek_id in [1, 2] {
        let availability = fx.service.availability(trek_id).await.unwrap();
        assert_eq!(availability.capacity, 0);
        assert!(!availability.has_space);
        assert!(matches!(
            fx.service.register(user("asha"), trek_id, form()).await,
            Err(RegistrationError::TrekFull)
        ));
    }
}

#[tokio::test]
async fn cancelled_registrations_stay_cancelled() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(5)));
    let registration = fx.service.register(user("asha"), 1, form()).await.unwrap();

    fx.service.cancel(user("asha"), registration.id).await.unwrap();
    assert!(matches!(
        fx.service.cancel(user("asha"), registration.id).await,
        Err(RegistrationError::UpdateFailed(_))
    ));

    // Nor can a proof be attached afterwards.
    let late_upload = fx
        .service
        .upload_payment_proof(
            user("asha"),
            registration.id,
            PaymentProofUpload {
                file_name: "receipt.png".to_owned(),
                bytes: vec![1],
                payer_name: "Asha Rao".to_owned(),
                payer_phone: "9876543210".to_owned(),
            },
        )
        .await;
    assert!(matches!(
        late_upload,
        Err(RegistrationError::UpdateFailed(_))
    ));
}

#[tokio::test]
async fn proof_upload_validates_inputs_before_storing() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(5)));
    let registration = fx.service.register(user("asha"), 1, form()).await.unwrap();

    let empty_file = fx
        .service
        .upload_payment_proof(
            user("asha"),
            registration.id,
            PaymentProofUpload {
                file_name: "receipt.png".to_owned(),
                bytes: Vec::new(),
                payer_name: "Asha Rao".to_owned(),
                payer_phone: "9876543210".to_owned(),
            },
        )
        .await;
    assert!(matches!(empty_file, Err(RegistrationError::UploadFailed(_))));

    let blank_payer = fx
        .service
        .upload_payment_proof(
            user("asha"),
            registration.id,
            PaymentProofUpload {
                file_name: "receipt.png".to_owned(),
                bytes: vec![1],
                payer_name: " ".to_owned(),
                payer_phone: "9876543210".to_owned(),
            },
        )
        .await;
    assert!(matches!(
        blank_payer,
        Err(RegistrationError::MissingContactDetails)
    ));

    // Nothing was stored by the rejected attempts.
    assert_eq!(fx.proofs.object_count(), 0);
}

#[tokio::test]
async fn registrations_are_owner_scoped() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(5)));
    let registration = fx.service.register(user("asha"), 1, form()).await.unwrap();

    assert!(matches!(
        fx.service.registration(user("ravi"), registration.id).await,
        Err(RegistrationError::NotFound)
    ));
    assert!(matches!(
        fx.service.cancel(user("ravi"), registration.id).await,
        Err(RegistrationError::NotFound)
    ));
}

#[tokio::test]
async fn tent_approval_cannot_oversubscribe_inventory() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(10)));
    fx.store
        .set_tent_inventory(1, TentKind("dome".to_owned()), 2);

    let big = fx
        .tents
        .request_tents(user("asha"), 1, TentKind("dome".to_owned()), 2)
        .await
        .unwrap();
    let small = fx
        .tents
        .request_tents(user("ravi"), 1, TentKind("dome".to_owned()), 1)
        .await
        .unwrap();

    fx.tents.approve_tent_request(big.id).await.unwrap();
    assert!(matches!(
        fx.tents.approve_tent_request(small.id).await,
        Err(RegistrationError::TentsUnavailable)
    ));

    // The refused approval left the request pending and the counters intact.
    let level = fx
        .store
        .tent_inventory(1, &TentKind("dome".to_owned()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.reserved, 2);

    // Approving an already-decided request fails visibly too.
    assert!(matches!(
        fx.tents.approve_tent_request(big.id).await,
        Err(RegistrationError::UpdateFailed(_))
    ));
}

#[tokio::test]
async fn tent_requests_validate_trek_and_quantity() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(10)));

    assert!(matches!(
        fx.tents
            .request_tents(user("asha"), 99, TentKind("dome".to_owned()), 1)
            .await,
        Err(RegistrationError::TrekNotLoaded)
    ));
    assert!(matches!(
        fx.tents
            .request_tents(user("asha"), 1, TentKind("dome".to_owned()), 0)
            .await,
        Err(RegistrationError::UpdateFailed(_))
    ));
    assert!(matches!(
        fx.tents
            .request_tents(None, 1, TentKind("dome".to_owned()), 1)
            .await,
        Err(RegistrationError::AuthRequired)
    ));
}

#[tokio::test]
async fn notifications_are_sent_but_never_critical() {
    let fx = fixture();
    fx.store.insert_trek(trek(1, Some(5)));
    fx.service.register(user("asha"), 1, form()).await.unwrap();

    let sent = fx.sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Registration received");
    assert!(sent[0].body.contains("Trek 1"));
    assert_eq!(sent[0].channels, vec!["email".to_owned()]);

    // A sink outage must not fail the workflow.
    let store = Arc::new(InMemoryStore::new());
    store.insert_trek(trek(1, Some(5)));
    let broken = RegistrationService::new(
        store.clone(),
        Arc::new(MemoryProofStore::new("https://proofs.example.com")),
        Notifier::new(
            NotificationTemplates::default(),
            vec!["email".to_owned()],
            Arc::new(FailingSink),
        ),
    );
    broken.register(user("asha"), 1, form()).await.unwrap();
}
