use advanced_signature::{
    BoundingRect, InputEvent, LogicalSize, PadConfig, PointerEvent, PointerPhase, RawPointer,
    SessionContext, SignaturePad,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::{fs::File, io::Write};

fn main() {
    let attestation = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&attestation);
    let mut pad = SignaturePad::new(
        PadConfig::default(),
        "Alice",
        SessionContext::placeholder(),
        move |signature| *sink.borrow_mut() = Some(signature),
    )
    .unwrap();
    pad.configure(LogicalSize {
        width: 400,
        height: 192,
    })
    .unwrap();

    // Pretend the pad sits at (40, 220) on the page and draw a wave with the mouse.
    let rect = BoundingRect {
        left: 40.0,
        top: 220.0,
        width: 400.0,
        height: 192.0,
    };
    let samples: Vec<(f64, f64)> = (0..=60)
        .map(|step| {
            let x = 30.0 + step as f64 * 5.5;
            let y = 96.0 + (step as f64 / 6.0).sin() * 40.0;
            (x, y)
        })
        .collect();
    for (index, (x, y)) in samples.iter().enumerate() {
        let phase = if index == 0 {
            PointerPhase::Down
        } else {
            PointerPhase::Move
        };
        pad.handle_event(&InputEvent {
            phase,
            pointer: PointerEvent::Mouse(RawPointer::at(x + rect.left, y + rect.top)),
            rect,
            timestamp_ms: index as u64 * 16,
        });
    }
    pad.handle_event(&InputEvent {
        phase: PointerPhase::Up,
        pointer: PointerEvent::Mouse(RawPointer::at(0.0, 0.0)),
        rect,
        timestamp_ms: samples.len() as u64 * 16,
    });

    let notices = pad.confirm().unwrap();
    println!("Notices: {:?}", notices);

    let attestation = attestation.borrow_mut().take().unwrap();
    println!("Certificate: {}", attestation.certificate_id());
    println!("Timestamp:   {}", attestation.timestamp());
    println!("Biometrics:  {:?}", attestation.biometrics());
    println!("Digest:      {}", attestation.image_digest());

    let mut png_file = File::create("./demos/result.png").unwrap();
    png_file.write_all(&attestation.image_png().unwrap()).unwrap();
}
