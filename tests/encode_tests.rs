//! End-to-end encoder tests
//!
//! Every symbol produced here is read back with the clean-grid reader, so
//! these tests cover segmentation, codeword layout, Reed-Solomon, placement,
//! masking and format/version information together.

use qrgen::encoder::mask::candidate_penalties;
use qrgen::encoder::tables::{alignment_pattern_positions, num_data_codewords};
use qrgen::{Charset, ECLevel, EncodeOptions, QRCode, QrError, Version, encode, encode_with, read};

fn round_trip(data: &[u8], options: &EncodeOptions) -> QRCode {
    let code = encode_with(data, options).expect("encode");
    let decoded = read(&code.modules).expect("read back");
    assert_eq!(decoded.data, data, "payload mismatch at {:?}", options);
    assert_eq!(decoded.version, code.version);
    assert_eq!(decoded.error_correction, options.ec_level);
    assert_eq!(decoded.mask_pattern, code.mask_pattern);
    code
}

#[test]
fn test_round_trip_all_levels() {
    let corpus: [&[u8]; 6] = [
        b"0123456789012345678901234567890",
        b"HELLO WORLD $%*+-./: 42",
        b"The quick brown fox jumps over the lazy dog",
        "Grüße, 東京! 🚀".as_bytes(),
        b"ABC123456789012345abc\x01\x02 MIXED 0000",
        b"a",
    ];
    for data in corpus {
        for ec in ECLevel::ALL {
            round_trip(data, &EncodeOptions::new(ec));
        }
    }
}

#[test]
fn test_round_trip_latin1_and_shift_jis() {
    let latin1 = b"caf\xE9 na\xEFve \xA9 2024";
    round_trip(latin1, &EncodeOptions::new(ECLevel::M).charset(Charset::Latin1));
    round_trip(
        latin1,
        &EncodeOptions::new(ECLevel::Q).charset(Charset::Latin1).eci(true),
    );

    // Four repeats of two kanji, then ASCII, in Shift JIS
    let sjis = [&b"\x93\x5F\xE4\xAA"[..]; 4].concat();
    let sjis = [sjis.as_slice(), b" QR 2024"].concat();
    let code = round_trip(&sjis, &EncodeOptions::new(ECLevel::L).charset(Charset::ShiftJis));
    let decoded = read(&code.modules).unwrap();
    assert_eq!(decoded.modes.first(), Some(&qrgen::encoder::segment::Mode::Kanji));
}

#[test]
fn test_round_trip_large_payloads() {
    let text: String = (0..2000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let code = round_trip(text.as_bytes(), &EncodeOptions::new(ECLevel::L));
    assert!(code.version.number() >= 27);

    let digits: String = (0..7089).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
    let code = round_trip(digits.as_bytes(), &EncodeOptions::new(ECLevel::L));
    assert_eq!(code.version.number(), 40);
}

#[test]
fn test_numeric_capacity_limit() {
    let digits = vec![b'7'; 7090];
    assert!(matches!(
        encode(&digits, ECLevel::L, None),
        Err(QrError::DataTooLarge { version: 40, .. })
    ));
}

#[test]
fn test_deterministic_output() {
    for data in [&b"HELLO WORLD"[..], b"https://example.com/?q=determinism"] {
        for ec in ECLevel::ALL {
            let a = encode(data, ec, None).unwrap();
            let b = encode(data, ec, None).unwrap();
            assert_eq!(a.modules.as_bytes(), b.modules.as_bytes());
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_hello_world_quartile() {
    let code = encode(b"HELLO WORLD", ECLevel::Q, None).unwrap();
    assert_eq!(code.version.number(), 1);
    assert_eq!(code.size(), 21);
    assert_eq!(read(&code.modules).unwrap().content, "HELLO WORLD");
}

#[test]
fn test_empty_and_oversized_input() {
    assert!(matches!(encode(b"", ECLevel::M, None), Err(QrError::EmptyInput)));
    assert!(matches!(
        encode(b"", ECLevel::M, Some(5)),
        Err(QrError::EmptyInput)
    ));

    let text = b"THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG 123456";
    match encode(text, ECLevel::H, Some(1)) {
        Err(QrError::DataTooLarge {
            capacity_bits,
            version,
            ..
        }) => {
            assert_eq!(capacity_bits, 72);
            assert_eq!(version, 1);
        }
        other => panic!("expected DataTooLarge, got {other:?}"),
    }
}

#[test]
fn test_invalid_utf8_rejected() {
    assert!(matches!(
        encode(b"ok\xFF\xFE", ECLevel::M, None),
        Err(QrError::UnsupportedCharacter { position: 2, .. })
    ));
}

/// Largest lowercase byte-mode payload for a version and level
fn max_bytes(version: Version, ec: ECLevel) -> usize {
    let count_bits = if version.number() <= 9 { 8 } else { 16 };
    (num_data_codewords(version, ec) * 8 - 4 - count_bits) / 8
}

/// Largest `n` whose single-segment stream fits the data capacity
fn max_chars(version: Version, ec: ECLevel, count_bits: [usize; 3], payload_bits: fn(usize) -> usize) -> usize {
    let class = match version.number() {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    let capacity = num_data_codewords(version, ec) * 8;
    let header = 4 + count_bits[class];
    (0..)
        .take_while(|&n| header + payload_bits(n) <= capacity)
        .last()
        .unwrap_or(0)
}

fn numeric_bits(n: usize) -> usize {
    10 * (n / 3) + [0, 4, 7][n % 3]
}

fn alphanumeric_bits(n: usize) -> usize {
    11 * (n / 2) + 6 * (n % 2)
}

/// `max` copies of `unit` fit at the forced version and one more does not
fn assert_boundary(unit: u8, max: usize, n: u8, ec: ECLevel) {
    let options = EncodeOptions::new(ec).version(n);
    let fits = vec![unit; max];
    let code = encode_with(&fits, &options)
        .unwrap_or_else(|e| panic!("{max} x {:?} at {n}-{ec}: {e}", char::from(unit)));
    assert_eq!(read(&code.modules).unwrap().data, fits);

    let over = vec![unit; max + 1];
    assert!(
        matches!(encode_with(&over, &options), Err(QrError::DataTooLarge { .. })),
        "{} x {:?} at {n}-{ec} should not fit",
        max + 1,
        char::from(unit)
    );
}

#[test]
fn test_capacity_boundaries() {
    for n in 1..=40u8 {
        let version = Version::new(n).unwrap();
        for ec in ECLevel::ALL {
            assert_boundary(b'a', max_bytes(version, ec), n, ec);
        }
    }
}

#[test]
fn test_numeric_and_alphanumeric_boundaries() {
    for n in [1u8, 9, 10, 26, 27, 40] {
        let version = Version::new(n).unwrap();
        for ec in ECLevel::ALL {
            let digits = max_chars(version, ec, [10, 12, 14], numeric_bits);
            assert_boundary(b'7', digits, n, ec);
            let letters = max_chars(version, ec, [9, 11, 13], alphanumeric_bits);
            assert_boundary(b'A', letters, n, ec);
        }
    }
    // Published capacities at the extremes
    assert_eq!(max_chars(Version::MIN, ECLevel::L, [10, 12, 14], numeric_bits), 41);
    assert_eq!(max_chars(Version::MIN, ECLevel::H, [9, 11, 13], alphanumeric_bits), 10);
    assert_eq!(max_chars(Version::MAX, ECLevel::L, [10, 12, 14], numeric_bits), 7089);
    assert_eq!(max_chars(Version::MAX, ECLevel::L, [9, 11, 13], alphanumeric_bits), 4296);
}

#[test]
fn test_bool_rows_match_modules() {
    let code = encode(b"rows", ECLevel::M, Some(3)).unwrap();
    let rows = code.to_bool_rows();
    assert_eq!(rows.len(), code.size());
    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), code.size());
        for (x, &dark) in row.iter().enumerate() {
            assert_eq!(dark, code.is_dark(x, y), "module ({x},{y})");
        }
    }
    assert!(rows[0][0] && !rows[7][7]);
}

#[test]
fn test_auto_version_is_smallest_fit() {
    for n in [1u8, 3, 9, 10, 20] {
        let version = Version::new(n).unwrap();
        let data = vec![b'a'; max_bytes(version, ECLevel::M)];
        let code = encode(&data, ECLevel::M, None).unwrap();
        assert_eq!(code.version, version);
        let code = encode(&[data.as_slice(), b"a"].concat(), ECLevel::M, None).unwrap();
        assert!(code.version > version);
    }
}

#[test]
fn test_chosen_mask_has_lowest_penalty() {
    for data in [
        &b"HELLO WORLD"[..],
        b"mask selection",
        b"01234567890123456789",
        b"https://example.com/a/b/c?d=e",
    ] {
        for ec in ECLevel::ALL {
            let code = encode(data, ec, None).unwrap();
            let penalties = candidate_penalties(&code);
            let chosen = code.mask_index() as usize;
            let best = *penalties.iter().min().unwrap();
            assert_eq!(penalties[chosen], best);
            assert!(penalties[..chosen].iter().all(|&p| p > best));
        }
    }
}

#[test]
fn test_fixed_mask_round_trips() {
    for mask in 0..8u8 {
        let code = round_trip(b"every mask", &EncodeOptions::new(ECLevel::Q).mask(mask));
        assert_eq!(code.mask_index(), mask);
    }
}

fn assert_finder(code: &QRCode, left: usize, top: usize) {
    for dy in 0..7 {
        for dx in 0..7 {
            let ring = dx.max(dy).max(6 - dx).max(6 - dy);
            let expected = ring != 5;
            assert_eq!(
                code.is_dark(left + dx, top + dy),
                expected,
                "finder at ({left},{top}) offset ({dx},{dy})"
            );
        }
    }
}

#[test]
fn test_structure_every_version() {
    for n in 1..=40u8 {
        let code = encode_with(b"structure", &EncodeOptions::new(ECLevel::L).version(n)).unwrap();
        let size = code.size();
        assert_eq!(size, 17 + 4 * n as usize);

        assert_finder(&code, 0, 0);
        assert_finder(&code, size - 7, 0);
        assert_finder(&code, 0, size - 7);

        for i in 8..size - 8 {
            assert_eq!(code.is_dark(i, 6), i % 2 == 0, "v{n} horizontal timing {i}");
            assert_eq!(code.is_dark(6, i), i % 2 == 0, "v{n} vertical timing {i}");
        }
        assert!(code.is_dark(8, size - 8), "v{n} dark module");

        let centers = alignment_pattern_positions(code.version);
        for &cx in &centers {
            for &cy in &centers {
                let in_finder = (cx < 9 && cy < 9) || (cx < 9 && cy > size - 9) || (cx > size - 9 && cy < 9);
                if !in_finder {
                    assert!(code.is_dark(cx, cy), "v{n} alignment center ({cx},{cy})");
                    assert!(!code.is_dark(cx + 1, cy), "v{n} alignment ring ({cx},{cy})");
                }
            }
        }

        let decoded = read(&code.modules).unwrap();
        assert_eq!(decoded.version.number(), n);
        assert_eq!(decoded.content, "structure");
    }
}
