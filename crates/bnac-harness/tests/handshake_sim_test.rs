//! Handshake simulations over turmoil TCP.
//!
//! Each test runs a scripted server on host "server" and drives the real
//! handshake driver from host "client".

use std::time::Duration;

use bnac_core::{
    HandshakeError, Session,
    driver::perform_handshake,
    env::Environment,
    handshake::{Credentials, Handshake, HandshakeConfig, HandshakeStep},
    identity::generate_client_id,
};
use bnac_crypto::push_token;
use bnac_harness::{SERVER_PORT, ScriptedServer, SimEnv, connect_to};
use bnac_proto::Message;
use proptest::prelude::*;

fn server_addr() -> String {
    format!("server:{SERVER_PORT}")
}

fn credentials() -> Credentials {
    Credentials { user: "alice".into(), encrypted_password: "c0ffee".into() }
}

async fn run_handshake(env: &SimEnv) -> Result<Session, HandshakeError> {
    let stream = connect_to(&server_addr()).await?;
    let local_addr = stream.local_addr()?;
    let handshake = Handshake::new(
        HandshakeConfig::default(),
        credentials(),
        generate_client_id(env),
        local_addr,
    );
    perform_handshake(stream, handshake).await
}

fn add_server(sim: &mut turmoil::Sim<'_>, server: ScriptedServer) {
    sim.host("server", move || {
        let server = server.clone();
        async move {
            server.serve().await?;
            Ok(())
        }
    });
}

#[test]
fn handshake_completes_and_pushes_token() {
    let mut sim = turmoil::Builder::new().build();

    let server = ScriptedServer::accepting("sid-1", "staff");
    let log = server.log();
    add_server(&mut sim, server);

    sim.client("client", async move {
        let env = SimEnv::new();
        let session = run_handshake(&env).await?;
        assert_eq!(session, Session::new("sid-1", "staff"));

        let client_ip = turmoil::lookup("client").to_string();
        let received = log.messages();
        let names: Vec<_> = received.iter().map(Message::name).collect();
        assert_eq!(names, ["ASK_ENCODE", "OPEN_SESAME", "SESAME_VALUE", "AUTH", "PUSH"]);

        let push = &received[4];
        assert_eq!(push.get("TIME"), Some(push_token("sid-1", &client_ip).as_str()));
        assert_eq!(push.get("SESSIONID"), Some("sid-1"));
        assert_eq!(push.get("ROLE"), Some("staff"));

        Ok(())
    });

    sim.run().expect("handshake simulation should complete");
}

#[test]
fn client_id_is_stable_for_a_seed() {
    let mut sim = turmoil::Builder::new().build();

    let server = ScriptedServer::accepting("sid-1", "staff");
    let log = server.log();
    add_server(&mut sim, server);

    sim.client("client", async move {
        let env = SimEnv::with_seed(99);
        run_handshake(&env).await?;

        let expected = generate_client_id(&SimEnv::with_seed(99));
        let ask = &log.messages()[0];
        assert_eq!(ask.get("CLIENTID"), Some(expected.as_str()));

        Ok(())
    });

    sim.run().expect("handshake simulation should complete");
}

#[test]
fn rejected_auth_never_sends_push() {
    let mut sim = turmoil::Builder::new().build();

    let server = ScriptedServer::new(vec![
        Message::new("601"),
        Message::new("603"),
        Message::new("604"),
        Message::new("500"),
    ]);
    let log = server.log();
    add_server(&mut sim, server);

    sim.client("client", async move {
        let err = run_handshake(&SimEnv::new()).await.unwrap_err();
        match err {
            HandshakeError::UnexpectedResponse { step, expected, actual } => {
                assert_eq!(step, HandshakeStep::Auth);
                assert_eq!(expected, "288");
                assert_eq!(actual, "500");
            },
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
        assert_eq!(log.names(), ["ASK_ENCODE", "OPEN_SESAME", "SESAME_VALUE", "AUTH"]);

        Ok(())
    });

    sim.run().expect("rejection simulation should complete");
}

#[test]
fn server_hang_up_is_connection_closed() {
    let mut sim = turmoil::Builder::new().build();

    let server = ScriptedServer::accepting("sid-1", "staff").hang_up_after(2);
    let log = server.log();
    add_server(&mut sim, server);

    sim.client("client", async move {
        let err = run_handshake(&SimEnv::new()).await.unwrap_err();
        assert!(
            matches!(err, HandshakeError::ConnectionClosed { step: HandshakeStep::OpenSesame }),
            "unexpected error: {err:?}"
        );
        assert_eq!(log.names(), ["ASK_ENCODE", "OPEN_SESAME"]);

        Ok(())
    });

    sim.run().expect("hang-up simulation should complete");
}

#[test]
fn handshake_with_latency() {
    let mut sim = turmoil::Builder::new()
        .simulation_duration(Duration::from_secs(60))
        .min_message_latency(Duration::from_millis(50))
        .max_message_latency(Duration::from_millis(50))
        .build();

    add_server(&mut sim, ScriptedServer::accepting("sid-1", "staff"));

    sim.client("client", async {
        let env = SimEnv::new();
        let start = env.now();
        run_handshake(&env).await?;
        let elapsed = env.now() - start;

        // Five request/response round trips at 100ms each.
        assert!(elapsed >= Duration::from_millis(500), "handshake too fast: {elapsed:?}");

        Ok(())
    });

    sim.run().expect("handshake should complete with latency");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn handshake_completes_for_any_seed_and_latency(seed in any::<u64>(), latency_ms in 0u64..200) {
        let latency = Duration::from_millis(latency_ms);
        let mut sim = turmoil::Builder::new()
            .simulation_duration(Duration::from_secs(60))
            .min_message_latency(latency)
            .max_message_latency(latency)
            .rng_seed(seed)
            .build();

        add_server(&mut sim, ScriptedServer::accepting("sid-1", "staff"));

        sim.client("client", async move {
            let session = run_handshake(&SimEnv::with_seed(seed)).await?;
            assert_eq!(session.session_id, "sid-1");
            Ok(())
        });

        prop_assert!(sim.run().is_ok());
    }
}
