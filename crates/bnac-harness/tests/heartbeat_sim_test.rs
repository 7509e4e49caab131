//! Heartbeat simulations over turmoil UDP.

use std::time::Duration;

use bnac_core::{
    Session,
    driver::perform_handshake,
    handshake::{Credentials, Handshake, HandshakeConfig},
    heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, HeartbeatRunner, HeartbeatScheduler},
};
use bnac_harness::{
    KeepAliveCollector, SERVER_PORT, ScriptedServer, SimDatagramTransport, SimEnv, connect_to,
};

fn runner(session: &Session) -> HeartbeatRunner<SimEnv, SimDatagramTransport> {
    HeartbeatRunner::new(
        SimEnv::new(),
        SimDatagramTransport::new("server", SERVER_PORT),
        DEFAULT_HEARTBEAT_INTERVAL,
        HeartbeatScheduler::new(session, "alice", "DOMAIN"),
    )
}

#[test]
fn keepalives_every_interval_after_handshake() {
    let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(300)).build();

    let server = ScriptedServer::accepting("sid-1", "staff");
    let collector = KeepAliveCollector::new();
    let keepalives = collector.log();

    sim.host("server", move || {
        let server = server.clone();
        let collector = collector.clone();
        async move {
            tokio::try_join!(server.serve(), collector.serve())?;
            Ok(())
        }
    });

    sim.client("client", async move {
        let stream = connect_to(&format!("server:{SERVER_PORT}")).await?;
        let local_addr = stream.local_addr()?;
        let credentials = Credentials { user: "alice".into(), encrypted_password: "c0ffee".into() };
        let handshake =
            Handshake::new(HandshakeConfig::default(), credentials, "{CLIENT}", local_addr);
        let session = perform_handshake(stream, handshake).await?;

        let _ = tokio::time::timeout(Duration::from_secs(200), runner(&session).run()).await;

        let entries = keepalives.entries();
        assert_eq!(entries.len(), 3, "expected keepalives at 60s, 120s and 180s");

        for (i, entry) in entries.iter().enumerate() {
            let msg = &entry.message;
            assert_eq!(msg.name(), "KEEP_ALIVE");
            assert_eq!(msg.get("SESSIONID"), Some("sid-1"));
            assert_eq!(msg.get("USER"), Some("alice"));
            assert_eq!(msg.get("AUTH_TYPE"), Some("DOMAIN"));
            assert_eq!(msg.get("HEARTBEAT_INDEX"), Some((i + 1).to_string().as_str()));
        }

        let gaps: Vec<_> = entries.windows(2).map(|w| w[1].at - w[0].at).collect();
        for gap in gaps {
            assert!(
                gap >= Duration::from_secs(59) && gap <= Duration::from_secs(61),
                "keepalive spacing off: {gap:?}"
            );
        }

        Ok(())
    });

    sim.run().expect("heartbeat simulation should complete");
}

#[test]
fn keepalives_continue_while_server_is_down() {
    let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(400)).build();

    let collector = KeepAliveCollector::new();
    let keepalives = collector.log();

    sim.host("server", move || {
        let collector = collector.clone();
        async move {
            collector.serve().await?;
            Ok(())
        }
    });

    sim.client("client", async move {
        let session = Session::new("sid-1", "staff");
        let heartbeat = tokio::spawn(runner(&session).run());

        // Partition the server away for the first two keepalives.
        turmoil::partition("client", "server");
        tokio::time::sleep(Duration::from_secs(150)).await;
        turmoil::repair("client", "server");
        tokio::time::sleep(Duration::from_secs(100)).await;
        heartbeat.abort();

        let indices: Vec<_> = keepalives
            .messages()
            .iter()
            .filter_map(|m| m.get("HEARTBEAT_INDEX").map(str::to_string))
            .collect();
        assert_eq!(indices, ["3", "4"]);

        Ok(())
    });

    sim.run().expect("heartbeat simulation should survive a partition");
}
