
use fixtures::HostFixture;
use tower::Service;

use crate::admission::{
    api::{AdmissionRequest, AdmissionResponse},
    error::AdmissionError,
    infrastructure::{
        naming::{
            ANNOTATION_ORIGINAL_NAME, LABEL_HOST, LABEL_INSTANCE, MAX_RECORD_ID_LEN,
            NamingStrategy, check_record_id,
        },
        resource::ResourceKind,
    },
    init_admission,
};

#[tokio::test]
async fn integration_multi_host_inventory() {
    // host1: pool default <- volume web-disk, boot-disk web-seed <- domain web
    // host2: boot-disk web-seed <- domain web, domain db -x host1 web-seed
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let (mut admission, index) = init_admission(NamingStrategy::PrefixHost);

    let host1 = HostFixture::new("libvirt-host1");
    let host2 = HostFixture::new("libvirt-host2");

    assert_eq!(admit!(admission, index, host1.pool("default")).record_id, "host1-default");
    assert_eq!(admit!(admission, index, host1.boot_disk("web-seed")).record_id, "host1-web-seed");
    assert_eq!(
        admit!(admission, index, host1.volume("web-disk", Some("default"))).record_id,
        "host1-web-disk"
    );
    assert_eq!(
        admit!(admission, index, host1.domain("web", Some("host1-web-seed"))).record_id,
        "host1-web"
    );

    // Same backend names on another host land on distinct records
    assert_eq!(admit!(admission, index, host2.boot_disk("web-seed")).record_id, "host2-web-seed");
    assert_eq!(
        admit!(admission, index, host2.domain("web", Some("host2-web-seed"))).record_id,
        "host2-web"
    );
    assert_eq!(index.len(), 6);

    let error = reject!(admission, host2.domain("db", Some("host1-web-seed")));
    assert!(error.is_rejection());
    assert_eq!(
        error,
        AdmissionError::CrossHostReference {
            referrer_kind: ResourceKind::Domain,
            referrer: "db".to_string(),
            referent_kind: ResourceKind::BootDisk,
            referent: "host1-web-seed".to_string(),
            owner: host2.owner().to_string(),
            referent_owner: host1.owner().to_string(),
        }
    );
    // Rejected resources are not stored
    assert_eq!(index.len(), 6);
}

#[tokio::test]
async fn integration_pool_names_shared_across_hosts() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let (mut admission, index) = init_admission(NamingStrategy::PrefixProvider);

    let host1 = HostFixture::new("libvirt-host1");
    let host2 = HostFixture::new("libvirt-host2");

    admit!(admission, index, host1.pool("default"));
    assert!(matches!(
        reject!(admission, host2.volume("db-disk", Some("default"))),
        AdmissionError::CrossHostReference { referent_kind: ResourceKind::Pool, referent_owner, .. }
            if referent_owner == host1.owner()
    ));

    // Declaring a homonym pool on host2 does not help: every candidate must match
    assert_eq!(
        admit!(admission, index, host2.pool("default")).record_id,
        "libvirt-host2-default"
    );
    assert!(matches!(
        reject!(admission, host2.volume("db-disk", Some("default"))),
        AdmissionError::CrossHostReference { .. }
    ));
    assert!(matches!(
        reject!(admission, host1.volume("web-disk", Some("default"))),
        AdmissionError::CrossHostReference { referent_owner, .. } if referent_owner == host2.owner()
    ));

    // Uniquely named pools keep working
    admit!(admission, index, host2.pool("db-images"));
    assert_eq!(
        admit!(admission, index, host2.volume("db-disk", Some("db-images"))).record_id,
        "libvirt-host2-db-disk"
    );
}

#[tokio::test]
async fn integration_naming_strategies_isolate_hosts() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let host1 = HostFixture::new("libvirt-host1");
    let host2 = HostFixture::new("libvirt-host2");

    for (strategy, expected1, expected2) in [
        (NamingStrategy::None, "web", "web"),
        (NamingStrategy::PrefixProvider, "libvirt-host1-web", "libvirt-host2-web"),
        (NamingStrategy::PrefixHost, "host1-web", "host2-web"),
        (NamingStrategy::Hash, "web-325219", "web-84ea66"),
    ] {
        let (mut admission, index) = init_admission(strategy);
        assert_eq!(admission.strategy(), strategy);

        let record1 = admit!(admission, index, host1.domain("web", None));
        let record2 = admit!(admission, index, host2.domain("web", None));
        assert_eq!(record1.record_id, expected1, "{strategy}");
        assert_eq!(record2.record_id, expected2, "{strategy}");

        // Operator metadata does not depend on the strategy
        assert_eq!(record1.labels.get(LABEL_INSTANCE).map(String::as_str), Some("libvirt-host1"));
        assert_eq!(record2.labels.get(LABEL_HOST).map(String::as_str), Some("host2"));
        assert_eq!(
            record1.annotations.get(ANNOTATION_ORIGINAL_NAME).map(String::as_str),
            Some("web")
        );
    }
}

#[tokio::test]
async fn integration_long_backend_names() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let host = HostFixture::new("libvirt-host1");
    let name = "Very_Long VM name that exceeds Kubernetes limits for resource names";

    for strategy in [
        NamingStrategy::None,
        NamingStrategy::PrefixProvider,
        NamingStrategy::PrefixHost,
        NamingStrategy::Hash,
    ] {
        let (mut admission, index) = init_admission(strategy);
        let record = admit!(admission, index, host.domain(name, None));
        assert!(record.record_id.len() <= MAX_RECORD_ID_LEN, "{strategy}: {}", record.record_id);
        assert_eq!(check_record_id(&record.record_id), Ok(()));
        assert_eq!(
            record.annotations.get(ANNOTATION_ORIGINAL_NAME).map(String::as_str),
            Some(name)
        );
    }
}

#[tokio::test]
async fn integration_delete_leaves_dangling_references() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let (mut admission, index) = init_admission(NamingStrategy::PrefixHost);

    let host1 = HostFixture::new("libvirt-host1");
    let host2 = HostFixture::new("libvirt-host2");

    let seed = host1.boot_disk("web-seed");
    let web = host1.domain("web", Some("host1-web-seed"));
    admit!(admission, index, seed.clone());
    admit!(admission, index, web.clone());

    // Deleting a referenced record is never blocked
    delete!(admission, index, seed, "host1-web-seed");

    let update = AdmissionRequest::Update { old: web.clone(), new: web };
    assert!(matches!(
        admission.call(update).await,
        Ok(AdmissionResponse::Admitted(record)) if record.record_id == "host1-web"
    ));

    // Once gone, the record no longer belongs to anyone
    assert_eq!(
        admit!(admission, index, host2.domain("db", Some("host1-web-seed"))).record_id,
        "host2-db"
    );
}

#[tokio::test]
async fn integration_explicit_record_ids() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let (mut admission, index) = init_admission(NamingStrategy::Hash);

    let host1 = HostFixture::new("libvirt-host1");
    let host2 = HostFixture::new("libvirt-host2");

    // Records created before the strategy was enabled keep their identifier
    let legacy = admit!(admission, index, host1.boot_disk("seed").with_record_id("seed"));
    assert_eq!(legacy.record_id, "seed");
    assert_eq!(
        admit!(admission, index, host1.domain("web", Some("seed")).with_record_id("web")).record_id,
        "web"
    );
    assert!(matches!(
        reject!(admission, host2.domain("web", Some("seed"))),
        AdmissionError::CrossHostReference { referent, .. } if referent == "seed"
    ));

    assert_eq!(
        reject!(admission, host2.pool("default").with_record_id("-default")),
        AdmissionError::InvalidRecordId("-default".to_string())
    );
}

#[tokio::test]
async fn integration_missing_owner() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let (mut admission, index) = init_admission(NamingStrategy::PrefixHost);

    let anonymous = HostFixture::new("");
    for resource in [
        anonymous.pool("default"),
        anonymous.boot_disk("seed"),
        anonymous.volume("disk", None),
        anonymous.domain("web", None),
    ] {
        let (kind, name) = (resource.kind(), resource.backend_name().to_string());
        assert_eq!(reject!(admission, resource), AdmissionError::MissingOwner(kind, name));
    }
    assert!(index.is_empty());
}

#[tokio::test]
async fn integration_missing_owner_before_record_id() {
    #[cfg(feature = "hostscope_tracing")]
    crate::hostscope_tracing::init();
    let anonymous = HostFixture::new("");

    for strategy in [
        NamingStrategy::None,
        NamingStrategy::PrefixProvider,
        NamingStrategy::PrefixHost,
        NamingStrategy::Hash,
    ] {
        let (mut admission, index) = init_admission(strategy);

        // No usable character left to derive an identifier from
        assert_eq!(
            reject!(admission, anonymous.pool("@@@")),
            AdmissionError::MissingOwner(ResourceKind::Pool, "@@@".to_string())
        );
        // Malformed identifier carried by the resource
        assert_eq!(
            reject!(admission, anonymous.boot_disk("seed").with_record_id("Bad_Id")),
            AdmissionError::MissingOwner(ResourceKind::BootDisk, "seed".to_string())
        );
        assert!(index.is_empty());
    }
}
