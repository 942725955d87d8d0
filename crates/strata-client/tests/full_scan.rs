//! Wire-level behavior of the full-scan orchestrator: the over-fetch-by-one
//! protocol and cursor advancement, checked against a scripted endpoint.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use strata_client::{Adapter, ConnectConfig};
use strata_model::Row;
use strata_server::protocol::{Request, Response};

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).ok()?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).ok()?;
    rmp_serde::from_slice(&buf).ok()
}

fn write_rows(stream: &mut TcpStream, ids: &[&str]) {
    let rows: Vec<Row> = ids.iter().map(|id| Row::new(*id)).collect();
    let bytes = rmp_serde::to_vec(&Response::Rows(rows)).unwrap();
    stream
        .write_all(&(bytes.len() as u32).to_be_bytes())
        .unwrap();
    stream.write_all(&bytes).unwrap();
    stream.flush().unwrap();
}

#[test]
fn full_scan_overfetches_by_one_and_advances_the_cursor() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        // Round 1: fresh cursor, batch_size 2 means limit 3. Answer with a
        // full page.
        match read_request(&mut stream).unwrap() {
            Request::Scan {
                start_row, limit, ..
            } => {
                assert_eq!(start_row, None);
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected request: {other:?}"),
        }
        write_rows(&mut stream, &["a", "b", "c"]);

        // Round 2: the cursor restarts at the last yielded row, which comes
        // back as the boundary duplicate. The short page ends the scan.
        match read_request(&mut stream).unwrap() {
            Request::Scan {
                start_row, limit, ..
            } => {
                assert_eq!(start_row.as_deref(), Some("c"));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected request: {other:?}"),
        }
        write_rows(&mut stream, &["c", "d"]);

        let _ = read_request(&mut stream);
    });

    let mut adapter = Adapter::connect(&addr, ConnectConfig::default()).unwrap();
    let ids: Vec<String> = adapter
        .full_scan("people", &[], 2)
        .map(|r| r.unwrap().id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    drop(adapter);
    handle.join().unwrap();
}

#[test]
fn full_scan_stops_without_a_second_request_on_a_short_first_page() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        assert!(matches!(
            read_request(&mut stream).unwrap(),
            Request::Scan { .. }
        ));
        write_rows(&mut stream, &["only"]);

        // The short page was the whole table; the next read must be the
        // client hanging up, not another scan.
        assert!(read_request(&mut stream).is_none());
    });

    let mut adapter = Adapter::connect(&addr, ConnectConfig::default()).unwrap();
    let ids: Vec<String> = adapter
        .full_scan("people", &[], 5)
        .map(|r| r.unwrap().id)
        .collect();
    assert_eq!(ids, vec!["only"]);

    drop(adapter);
    handle.join().unwrap();
}
