//! End-to-end session tests over localhost TCP.

use std::io::Write;
use std::thread;

use bytes::Bytes;
use linedrop_session::{accept, connect, SessionError, UploadOutcome};
use linedrop_storage::{BatchSequence, MemoryStorage, Storage};
use linedrop_transport::TcpSocket;

fn lines(items: &[&'static str]) -> Vec<Bytes> {
    items.iter().map(|s| Bytes::from_static(s.as_bytes())).collect()
}

#[test]
fn upload_then_terminate() {
    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();

    let server = thread::spawn(move || {
        let storage = MemoryStorage::new();
        let sequence = BatchSequence::new();
        let session = accept(&socket).unwrap();
        let stats = session.run(&storage, &sequence).unwrap();
        (stats, storage.batches())
    });

    let mut client = connect(addr).unwrap();
    let outcome = client.upload(lines(&["hello", ""])).unwrap();
    assert_eq!(outcome, UploadOutcome::Accepted);
    client.finish().unwrap();

    let (stats, batches) = server.join().unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, 1);
    assert_eq!(batches[0].1, lines(&["hello", ""]));
}

#[test]
fn two_frames_one_connection_equals_two_connections() {
    let run = |per_connection: &[Vec<Bytes>]| -> Vec<(u64, Vec<Bytes>)> {
        let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr();
        let connections = per_connection.len();

        let server = thread::spawn(move || {
            let storage = MemoryStorage::new();
            let sequence = BatchSequence::new();
            for _ in 0..connections {
                let session = accept(&socket).unwrap();
                session.run(&storage, &sequence).unwrap();
            }
            storage.batches()
        });

        for batches in per_connection {
            let mut client = connect(addr).unwrap();
            for batch in batches {
                client.upload(vec![batch.clone()]).unwrap();
            }
            client.finish().unwrap();
        }

        server.join().unwrap()
    };

    let one_connection = run(&[vec![
        Bytes::from_static(b"first"),
        Bytes::from_static(b"second"),
    ]]);
    let two_connections = run(&[
        vec![Bytes::from_static(b"first")],
        vec![Bytes::from_static(b"second")],
    ]);

    assert_eq!(one_connection, two_connections);
}

#[test]
fn rejected_batch_is_visible_to_the_client() {
    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();

    let server = thread::spawn(move || {
        let storage = MemoryStorage::with_capacity(1);
        let sequence = BatchSequence::new();
        let session = accept(&socket).unwrap();
        let stats = session.run(&storage, &sequence).unwrap();
        (stats, storage.len())
    });

    let mut client = connect(addr).unwrap();
    assert_eq!(
        client.upload(lines(&["kept"])).unwrap(),
        UploadOutcome::Accepted
    );
    assert_eq!(
        client.upload(lines(&["dropped"])).unwrap(),
        UploadOutcome::Rejected
    );
    client.finish().unwrap();

    let (stats, stored) = server.join().unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stored, 1);
}

#[test]
fn partial_frame_then_disconnect_raises_instead_of_hanging() {
    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();

    let server = thread::spawn(move || {
        let storage = MemoryStorage::new();
        let sequence = BatchSequence::new();
        let session = accept(&socket).unwrap();
        let result = session.run(&storage, &sequence);
        (result, storage.is_empty())
    });

    // Raw client: declare 5 lines, deliver 3, then vanish.
    let mut raw = TcpSocket::connect(addr).unwrap();
    raw.write_all(&5u32.to_be_bytes()).unwrap();
    raw.write_all(b"one\ntwo\nthree\n").unwrap();
    drop(raw);

    let (result, storage_untouched) = server.join().unwrap();
    assert!(matches!(result, Err(SessionError::Disconnected(_))));
    assert!(storage_untouched);
}

#[test]
fn staggered_arrival_of_header_and_lines() {
    // The header may arrive split and well before the lines; the
    // original client even sleeps between the two header halves.
    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();

    let server = thread::spawn(move || {
        let storage = MemoryStorage::new();
        let sequence = BatchSequence::new();
        let session = accept(&socket).unwrap();
        session.run(&storage, &sequence).unwrap();
        storage.batch(1)
    });

    let mut raw = TcpSocket::connect(addr).unwrap();
    raw.write_all(&[0x00, 0x00]).unwrap();
    thread::sleep(std::time::Duration::from_millis(20));
    raw.write_all(&[0x00, 0x01]).unwrap();
    thread::sleep(std::time::Duration::from_millis(20));
    raw.write_all(b"slow\n").unwrap();
    raw.write_all(&[0, 0, 0, 0]).unwrap();

    let mut response = Vec::new();
    std::io::Read::read_to_end(&mut raw, &mut response).unwrap();
    assert_eq!(response, b"AQ");

    let batch = server.join().unwrap().unwrap();
    assert_eq!(batch[0].as_ref(), b"slow");
}

#[test]
fn concurrent_sessions_share_one_index_space() {
    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();
    let clients = 4usize;
    let frames_per_client = 8usize;

    let server = thread::spawn(move || {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        let sequence = std::sync::Arc::new(BatchSequence::new());
        let mut workers = Vec::new();
        for _ in 0..clients {
            let session = accept(&socket).unwrap();
            let storage = std::sync::Arc::clone(&storage);
            let sequence = std::sync::Arc::clone(&sequence);
            workers.push(thread::spawn(move || {
                session.run(storage.as_ref(), sequence.as_ref()).unwrap()
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }
        storage.batches()
    });

    let mut uploaders = Vec::new();
    for c in 0..clients {
        uploaders.push(thread::spawn(move || {
            let mut client = connect(addr).unwrap();
            for f in 0..frames_per_client {
                let line = Bytes::from(format!("client-{c}-frame-{f}"));
                assert_eq!(client.upload(vec![line]).unwrap(), UploadOutcome::Accepted);
            }
            client.finish().unwrap();
        }));
    }
    for uploader in uploaders {
        uploader.join().unwrap();
    }

    let batches = server.join().unwrap();
    let indices: Vec<u64> = batches.iter().map(|(i, _)| *i).collect();
    let expected: Vec<u64> = (1..=(clients * frames_per_client) as u64).collect();
    assert_eq!(indices, expected);
}

#[test]
fn storage_trait_object_is_accepted() {
    // Sessions only need the collaborator interface, not a concrete type.
    let storage = MemoryStorage::new();
    let dynamic: &dyn Storage = &storage;
    let sequence = BatchSequence::new();

    let socket = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr();

    let client = thread::spawn(move || {
        let mut client = connect(addr).unwrap();
        client.upload(lines(&["dyn"])).unwrap();
        client.finish().unwrap();
    });

    let session = accept(&socket).unwrap();
    let stats = session.run(dynamic, &sequence).unwrap();
    client.join().unwrap();

    assert_eq!(stats.accepted, 1);
    assert_eq!(storage.batch(1).unwrap()[0].as_ref(), b"dyn");
}
