use alice_ringbuf::{Error, Mode, RingBuffer};

fn check_counts(rb: &RingBuffer<'_>) {
    assert_eq!(rb.free_len() + rb.full_len(), rb.capacity() - 1);
}

#[test]
fn example_scenario_capacity_nine() {
    let mut storage = [0u8; 9];
    let mut rb = RingBuffer::new(&mut storage).expect("init");

    assert_eq!(rb.write(b"abc"), 3);
    assert_eq!(rb.full_len(), 3);
    assert_eq!(rb.write(b"abcdef"), 5);
    assert_eq!(rb.full_len(), 8);

    let mut out = [0u8; 3];
    assert_eq!(rb.read(&mut out), 3);
    assert_eq!(&out, b"abc");
    assert_eq!(rb.full_len(), 5);

    // only 3 bytes are free now; partial mode takes what fits
    assert_eq!(rb.write(b"abcdef"), 3);
    assert_eq!(rb.full_len(), 8);
    check_counts(&rb);
}

#[test]
fn fill_to_usable_capacity() {
    let mut storage = [0u8; 33];
    let mut rb = RingBuffer::new(&mut storage).expect("init");

    assert_eq!(rb.write(&[0x55; 32]), 32);
    assert_eq!(rb.free_len(), 0);
    assert_eq!(rb.write_ex(b"!", Mode::AllOrNothing), Err(Error::Full));
    assert_eq!(rb.write_ex(b"!", Mode::Partial), Err(Error::Full));
    assert_eq!(rb.write(b"!"), 0);
    assert_eq!(rb.full_len(), 32);
}

#[test]
fn fifo_over_many_wraps() {
    let mut storage = [0u8; 17];
    let mut rb = RingBuffer::new(&mut storage).expect("init");

    let source: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 256) as u8).collect();
    let mut sink = Vec::with_capacity(source.len());
    let mut pos = 0;
    let mut step = 1;
    let mut out = [0u8; 16];

    while sink.len() < source.len() {
        let end = (pos + step).min(source.len());
        pos += rb.write(&source[pos..end]);
        check_counts(&rb);

        let want = (step * 3 % 16) + 1;
        let n = rb.read(&mut out[..want]);
        sink.extend_from_slice(&out[..n]);
        check_counts(&rb);

        step = step % 15 + 1;
    }
    assert_eq!(sink, source);
}

#[test]
fn roundtrip_linear_and_straddling() {
    let mut storage = [0u8; 10];
    let mut rb = RingBuffer::new(&mut storage).expect("init");
    let mut out = [0u8; 9];

    // entirely linear
    assert_eq!(rb.write(b"linear"), 6);
    assert_eq!(rb.read(&mut out[..6]), 6);
    assert_eq!(&out[..6], b"linear");

    // cursors at 6: a 7-byte write straddles the end of storage
    assert_eq!(rb.write(b"straddl"), 7);
    assert_eq!(rb.linear_read_length(), 4);
    assert_eq!(rb.read(&mut out[..7]), 7);
    assert_eq!(&out[..7], b"straddl");
}

#[test]
fn peek_matches_following_read() {
    let mut storage = [0u8; 8];
    let mut rb = RingBuffer::new(&mut storage).expect("init");
    rb.advance(5);
    rb.skip(5);
    rb.write(b"123456");

    let mut peeked = [0u8; 6];
    assert_eq!(rb.peek(0, &mut peeked), 6);
    assert_eq!(rb.full_len(), 6);

    let mut read = [0u8; 6];
    assert_eq!(rb.read(&mut read), 6);
    assert_eq!(peeked, read);
}

#[test]
fn skip_matches_read_into_discard() {
    let mut a_storage = [0u8; 12];
    let mut b_storage = [0u8; 12];
    let mut a = RingBuffer::new(&mut a_storage).expect("init");
    let mut b = RingBuffer::new(&mut b_storage).expect("init");

    for n in [0usize, 3, 20] {
        a.write(b"0123456789");
        b.write(b"0123456789");
        let before = a.full_len();

        let skipped = a.skip(n);
        let mut discard = vec![0u8; n];
        let read = b.read(&mut discard);

        assert_eq!(skipped, n.min(before));
        assert_eq!(skipped, read);
        assert_eq!(a.full_len(), b.full_len());
    }
}

#[test]
fn find_planted_across_wrap() {
    let mut storage = [0u8; 16];
    let mut rb = RingBuffer::new(&mut storage).expect("init");
    rb.advance(12);
    rb.skip(12);
    rb.write(b"..\r\nOK\r\n");

    assert_eq!(rb.find(b"OK\r\n", 0), Some(4));
    assert_eq!(rb.find(b"\r\n", 0), Some(2));
    assert_eq!(rb.find(b"\r\n", 3), Some(6));
    assert_eq!(rb.find(b"ERROR", 0), None);
    assert_eq!(rb.find(b"OK", 9), None);
}
