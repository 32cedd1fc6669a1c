//! Participant pair normalization

use linkup::shared::messaging::{Conversation, ParticipantPair};
use proptest::prelude::*;
use uuid::Uuid;

fn uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #[test]
    fn test_pair_ignores_argument_order(a in uuid(), b in uuid()) {
        let pair = ParticipantPair::new(a, b);
        prop_assert_eq!(pair, ParticipantPair::new(b, a));
        prop_assert!(pair.low() <= pair.high());
        prop_assert!(pair.contains(a) && pair.contains(b));
    }

    #[test]
    fn test_other_participant_is_the_other_one(a in uuid(), b in uuid()) {
        prop_assume!(a != b);
        let conversation = Conversation::new_direct(a, b);
        prop_assert_eq!(conversation.other_participant(a), Some(b));
        prop_assert_eq!(conversation.other_participant(b), Some(a));
        prop_assert_eq!(conversation.pair(), ParticipantPair::new(b, a));
    }
}
