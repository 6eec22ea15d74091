use super::*;
use crate::testing::{hand_pose, pose_landmarks};

#[test]
fn test_open_palm() {
    let hand = hand_pose([true; 5], Handedness::Right);
    assert_eq!(classify(&hand), Some(Gesture::OpenPalm));
}

#[test]
fn test_index_pointing() {
    let landmarks = pose_landmarks([false, true, false, false, false]);
    assert_eq!(classify_landmarks(&landmarks), Some(Gesture::IndexPointing));
}

#[test]
fn test_thumb_up() {
    let landmarks = pose_landmarks([true, false, false, false, false]);
    assert_eq!(classify_landmarks(&landmarks), Some(Gesture::ThumbUp));
}

#[test]
fn test_fist_is_no_gesture() {
    let landmarks = pose_landmarks([false; 5]);
    assert_eq!(FingerState::from_landmarks(&landmarks).count(), 0);
    assert_eq!(classify_landmarks(&landmarks), None);
}

#[test]
fn test_other_patterns_are_no_gesture() {
    // Every 5-bit pattern except the three named ones yields nothing.
    for bits in 0u8..32 {
        let pattern = [
            bits & 1 != 0,
            bits & 2 != 0,
            bits & 4 != 0,
            bits & 8 != 0,
            bits & 16 != 0,
        ];
        let state = FingerState::from_landmarks(&pose_landmarks(pattern));
        assert_eq!(state.as_array(), pattern, "fixture drift for {:?}", pattern);

        let expected = match pattern {
            [true, true, true, true, true] => Some(Gesture::OpenPalm),
            [false, true, false, false, false] => Some(Gesture::IndexPointing),
            [true, false, false, false, false] => Some(Gesture::ThumbUp),
            _ => None,
        };
        assert_eq!(state.gesture(), expected, "pattern {}", state);
    }
}

#[test]
fn test_thumb_needs_spread_and_lift() {
    let mut landmarks = pose_landmarks([true, false, false, false, false]);
    // Lowered below the IP joint: spread alone is not enough.
    landmarks[index::THUMB_TIP].y = landmarks[index::THUMB_IP].y + 0.05;
    assert!(!FingerState::from_landmarks(&landmarks).thumb);

    let mut landmarks = pose_landmarks([true, false, false, false, false]);
    // Tucked next to the wrist horizontally.
    let wrist_x = landmarks[index::WRIST].x;
    landmarks[index::THUMB_TIP].x = wrist_x - 0.05;
    assert!(!FingerState::from_landmarks(&landmarks).thumb);
}

#[test]
fn test_finger_needs_margin_above_mcp() {
    let mut landmarks = pose_landmarks([false, true, false, false, false]);
    let mcp_y = landmarks[index::INDEX_FINGER_MCP].y;
    // Above the PIP joint but within 10% of the MCP height.
    landmarks[index::INDEX_FINGER_PIP].y = mcp_y;
    landmarks[index::INDEX_FINGER_TIP].y = mcp_y * 0.95;
    assert!(!FingerState::from_landmarks(&landmarks).index);
}

#[test]
fn test_classify_result_keeps_order() {
    let result = DetectionResult::new(
        vec![
            hand_pose([true; 5], Handedness::Left),
            hand_pose([false; 5], Handedness::Right),
        ],
        0,
    );
    let gestures = classify_result(&result);
    assert_eq!(
        gestures,
        vec![
            (Handedness::Left, Some(Gesture::OpenPalm)),
            (Handedness::Right, None)
        ]
    );
}

#[test]
fn test_finger_state_display() {
    let state = FingerState::from_landmarks(&pose_landmarks([false, true, false, false, false]));
    assert_eq!(state.to_string(), "[0,1,0,0,0]");
}
