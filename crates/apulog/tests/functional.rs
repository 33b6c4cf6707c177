use apulog::ProtocolError;
use apulog::chip::{Channel, ClockRate, Function};
use apulog::functional::{
    CompactEvent, FunctionalEvent, from_compact, to_compact, to_functional, to_raw,
};
use apulog::vgm::RawEvent;

fn write(register: u8, value: u8) -> RawEvent {
    RawEvent::RegisterWrite { register, value }
}

fn log() -> Vec<RawEvent> {
    vec![
        RawEvent::Clock(ClockRate::PAL),
        write(0x15, 0x0F),
        write(0x17, 0x40),
        write(0x01, 0x8A),
        write(0x00, 0x9C),
        write(0x02, 0x40),
        write(0x03, 0x11),
        RawEvent::Wait(882),
        write(0x02, 0x41),
        write(0x02, 0x42),
        write(0x08, 0xFF),
        write(0x0A, 0x80),
        write(0x0B, 0x00),
        RawEvent::Wait(882),
        write(0x15, 0x00),
        RawEvent::Wait(1),
    ]
}

/// Function/value pairs between waits, ignoring atom numbering.
fn observed(events: &[FunctionalEvent]) -> Vec<Vec<(Channel, Function, u8)>> {
    let mut runs = vec![Vec::new()];
    for event in events {
        match event {
            FunctionalEvent::Wait(_) => runs.push(Vec::new()),
            FunctionalEvent::FunctionWrite(w) => {
                if let Some(run) = runs.last_mut() {
                    run.push((w.channel, w.function, w.value));
                }
            }
            FunctionalEvent::Clock(_) => {}
        }
    }
    runs
}

#[test]
fn raw_to_functional_and_back() {
    let functional = to_functional(&log()).unwrap();
    assert_eq!(to_raw(&functional).unwrap(), log());
    let again = to_functional(&to_raw(&functional).unwrap()).unwrap();
    assert_eq!(observed(&again), observed(&functional));
}

#[test]
fn repeated_register_opens_new_atom() {
    let functional = to_functional(&log()).unwrap();
    let atoms: Vec<(u8, u32)> = functional
        .iter()
        .filter_map(|e| match e {
            FunctionalEvent::FunctionWrite(w)
                if w.channel == Channel::Pulse1 && w.function == Function::TimerLow =>
            {
                Some((w.value, w.atom))
            }
            _ => None,
        })
        .collect();
    assert_eq!(atoms, vec![(0x40, 0), (0x41, 0), (0x42, 1)]);
}

#[test]
fn status_byte_splits_into_enables() {
    let functional = to_functional(&log()).unwrap();
    let text: Vec<String> = functional[1..6].iter().map(|e| e.to_string()).collect();
    assert_eq!(
        text,
        vec![
            "apu,ch,dm,0,0,0",
            "apu,ch,no,1,0,0",
            "apu,ch,tr,1,0,0",
            "apu,ch,p2,1,0,0",
            "apu,ch,p1,1,0,0",
        ]
    );
}

#[test]
fn compact_log_round_trips_state() {
    let functional = to_functional(&log()).unwrap();
    let compact = to_compact(&functional).unwrap();
    assert!(compact.iter().all(|e| !matches!(
        e,
        CompactEvent::Write {
            function: Function::EnableDmc | Function::FrameIrqInhibit,
            ..
        }
    )));
    let rebuilt = from_compact(&compact).unwrap();
    assert_eq!(to_raw(&rebuilt).unwrap().len(), to_raw(&functional).unwrap().len());
    assert_eq!(to_compact(&rebuilt).unwrap(), compact);
}

#[test]
fn unknown_register_is_a_protocol_error() {
    let events = vec![RawEvent::Clock(ClockRate::NTSC), write(0x16, 0x01)];
    assert_eq!(
        to_functional(&events),
        Err(ProtocolError::UnknownRegister(0x16))
    );
    assert_eq!(
        to_functional(&[RawEvent::Wait(1)]),
        Err(ProtocolError::MissingClock)
    );
}
