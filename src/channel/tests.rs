use super::*;
use crate::{
    abiencode::types::Signature,
    error::Error,
    sig::{RecoveryError, Signer},
    token::{MemoryToken, Token},
};

const SENDER_KEY: [u8; 32] = [0x11; 32];
const RECEIVER_KEY: [u8; 32] = [0x22; 32];
const CHANNEL: Address = Address([0xcc; 20]);
const TOKEN: Address = Address([0x70; 20]);
const PERIOD: u64 = 500;
const START: u64 = 1_000;

struct Setup {
    sender: Signer,
    receiver: Signer,
    token: MemoryToken,
    channel: Channel,
}

impl Setup {
    fn new() -> Self {
        let sender = Signer::from_bytes(&SENDER_KEY).unwrap();
        let receiver = Signer::from_bytes(&RECEIVER_KEY).unwrap();
        let mut token = MemoryToken::new(TOKEN);
        token.mint(sender.address(), U256::from(1_000u64));
        token
            .approve(sender.address(), CHANNEL, U256::from(1_000u64))
            .unwrap();
        let channel = Channel::open(OpenParams {
            address: CHANNEL,
            sender: sender.address(),
            receiver: receiver.address(),
            token: TOKEN,
            challenge_period: PERIOD,
            start_time: START,
        })
        .unwrap();
        Setup {
            sender,
            receiver,
            token,
            channel,
        }
    }

    fn funded(amount: u64) -> Self {
        let mut s = Self::new();
        let sender = s.sender.address();
        s.channel
            .recharge(&mut s.token, sender, CHANNEL, amount.into())
            .unwrap();
        s
    }

    fn withdrawal_sig(&self, balance: u64) -> Signature {
        BalanceProof::withdrawal(self.receiver.address(), balance.into(), CHANNEL)
            .sign(&self.sender)
            .unwrap()
    }

    fn closing_sig(&self, balance: u64) -> Signature {
        BalanceProof::closing(self.sender.address(), balance.into(), CHANNEL)
            .sign(&self.receiver)
            .unwrap()
    }

    fn withdraw(&mut self, balance: u64) -> crate::Result<U256> {
        let sig = self.withdrawal_sig(balance);
        let receiver = self.receiver.address();
        self.channel
            .withdraw(&mut self.token, receiver, balance.into(), sig.as_bytes())
    }

    fn mutual(&mut self, caller: Address, balance: u64) -> crate::Result<Settlement> {
        let sender_sig = self.withdrawal_sig(balance);
        let receiver_sig = self.closing_sig(balance);
        self.channel.mutual_settlement(
            &mut self.token,
            caller,
            balance.into(),
            sender_sig.as_bytes(),
            receiver_sig.as_bytes(),
        )
    }

    fn balance(&self, who: Address) -> U256 {
        self.token.balance_of(who)
    }
}

#[test]
fn open_starts_initiated() {
    let s = Setup::new();
    let info = s.channel.info();
    assert_eq!(info.status, Status::Initiated);
    assert_eq!(info.deposit, U256::zero());
    assert_eq!(info.withdrawn, U256::zero());
    assert_eq!(info.sender, s.sender.address());
    assert_eq!(info.start_time, START);
    assert_eq!(s.channel.challenge(), None);
}

macro_rules! make_open_rejected {
    ($name:ident, $sender:expr, $receiver:expr, $token:expr, $period:expr, $err:expr) => {
        #[test]
        fn $name() {
            let res = Channel::open(OpenParams {
                address: CHANNEL,
                sender: $sender,
                receiver: $receiver,
                token: $token,
                challenge_period: $period,
                start_time: START,
            });
            assert_eq!(res, Err($err));
        }
    };
}

make_open_rejected!(
    open_zero_sender,
    Address::ZERO,
    Address([1; 20]),
    TOKEN,
    PERIOD,
    Error::ZeroAddress(Role::Sender)
);
make_open_rejected!(
    open_zero_receiver,
    Address([1; 20]),
    Address::ZERO,
    TOKEN,
    PERIOD,
    Error::ZeroAddress(Role::Receiver)
);
make_open_rejected!(
    open_same_participants,
    Address([1; 20]),
    Address([1; 20]),
    TOKEN,
    PERIOD,
    Error::SameParticipants
);
make_open_rejected!(
    open_zero_token,
    Address([1; 20]),
    Address([2; 20]),
    Address::ZERO,
    PERIOD,
    Error::TokenNotContract(Address::ZERO)
);
make_open_rejected!(
    open_zero_period,
    Address([1; 20]),
    Address([2; 20]),
    TOKEN,
    0,
    Error::ZeroChallengePeriod
);

#[test]
fn recharge_accumulates_deposit() {
    let mut s = Setup::funded(300);
    let sender = s.sender.address();
    s.channel
        .recharge(&mut s.token, sender, CHANNEL, U256::from(200u64))
        .unwrap();

    assert_eq!(s.channel.status(), Status::Recharged);
    assert_eq!(s.channel.deposit(), U256::from(500u64));
    assert_eq!(s.balance(CHANNEL), U256::from(500u64));
    assert_eq!(s.balance(sender), U256::from(500u64));
}

#[test]
fn recharge_rejects_bad_calls_without_effect() {
    let mut s = Setup::funded(100);
    let before = s.channel;
    let sender = s.sender.address();
    let receiver = s.receiver.address();

    assert_eq!(
        s.channel.recharge(&mut s.token, receiver, CHANNEL, U256::from(10u64)),
        Err(Error::Unauthorized {
            caller: receiver,
            expected: Role::Sender
        })
    );
    assert_eq!(
        s.channel.recharge(&mut s.token, sender, CHANNEL, U256::zero()),
        Err(Error::ZeroAmount)
    );
    // Only 900 of the allowance are left.
    assert!(matches!(
        s.channel.recharge(&mut s.token, sender, CHANNEL, U256::from(901u64)),
        Err(Error::Token(_))
    ));

    assert_eq!(s.channel, before);
    assert_eq!(s.balance(CHANNEL), U256::from(100u64));
}

#[test]
fn recharge_after_withdrawal_is_rejected() {
    let mut s = Setup::funded(500);
    s.withdraw(100).unwrap();
    let sender = s.sender.address();

    assert_eq!(
        s.channel.recharge(&mut s.token, sender, CHANNEL, U256::from(10u64)),
        Err(Error::InvalidStatus {
            operation: Operation::Recharge,
            status: Status::Withdrawn
        })
    );
}

#[test]
fn withdraw_pays_difference_to_previous_claim() {
    let mut s = Setup::funded(500);
    let receiver = s.receiver.address();

    assert_eq!(s.withdraw(100), Ok(U256::from(100u64)));
    assert_eq!(s.channel.status(), Status::Withdrawn);
    assert_eq!(s.channel.withdrawn(), U256::from(100u64));
    assert_eq!(s.balance(receiver), U256::from(100u64));

    assert_eq!(s.withdraw(300), Ok(U256::from(200u64)));
    assert_eq!(s.channel.withdrawn(), U256::from(300u64));
    assert_eq!(s.balance(receiver), U256::from(300u64));
    assert_eq!(s.balance(CHANNEL), U256::from(200u64));
}

#[test]
fn withdraw_replay_is_rejected() {
    let mut s = Setup::funded(500);
    s.withdraw(300).unwrap();
    let before = s.channel;

    for balance in [300, 100] {
        assert_eq!(
            s.withdraw(balance),
            Err(Error::StaleBalance {
                balance: balance.into(),
                withdrawn: U256::from(300u64)
            })
        );
    }
    assert_eq!(s.channel, before);
    assert_eq!(s.balance(s.receiver.address()), U256::from(300u64));
}

#[test]
fn withdraw_above_deposit_is_rejected() {
    let mut s = Setup::funded(500);
    assert_eq!(
        s.withdraw(501),
        Err(Error::BalanceExceedsDeposit {
            balance: U256::from(501u64),
            deposit: U256::from(500u64)
        })
    );
}

#[test]
fn withdraw_before_recharge_is_rejected() {
    let mut s = Setup::new();
    assert_eq!(
        s.withdraw(1),
        Err(Error::InvalidStatus {
            operation: Operation::Withdraw,
            status: Status::Initiated
        })
    );
}

#[test]
fn withdraw_by_sender_is_rejected() {
    let mut s = Setup::funded(500);
    let sig = s.withdrawal_sig(100);
    let sender = s.sender.address();
    assert_eq!(
        s.channel
            .withdraw(&mut s.token, sender, U256::from(100u64), sig.as_bytes()),
        Err(Error::Unauthorized {
            caller: sender,
            expected: Role::Receiver
        })
    );
}

#[test]
fn withdraw_signed_by_receiver_is_rejected() {
    let mut s = Setup::funded(500);
    let receiver = s.receiver.address();
    let sig = BalanceProof::withdrawal(receiver, U256::from(100u64), CHANNEL)
        .sign(&s.receiver)
        .unwrap();

    assert_eq!(
        s.channel
            .withdraw(&mut s.token, receiver, U256::from(100u64), sig.as_bytes()),
        Err(Error::InvalidSigner {
            expected: Role::Sender,
            address: s.sender.address(),
            recovered: receiver,
        })
    );
    assert_eq!(s.channel.withdrawn(), U256::zero());
}

#[test]
fn withdraw_proof_for_other_channel_is_rejected() {
    let mut s = Setup::funded(500);
    let receiver = s.receiver.address();
    let sig = BalanceProof::withdrawal(receiver, U256::from(100u64), Address([0xdd; 20]))
        .sign(&s.sender)
        .unwrap();

    assert!(matches!(
        s.channel
            .withdraw(&mut s.token, receiver, U256::from(100u64), sig.as_bytes()),
        Err(Error::InvalidSigner { .. })
    ));
}

#[test]
fn withdraw_with_truncated_signature_is_rejected() {
    let mut s = Setup::funded(500);
    let sig = s.withdrawal_sig(100);
    let receiver = s.receiver.address();
    assert_eq!(
        s.channel
            .withdraw(&mut s.token, receiver, U256::from(100u64), &sig.as_bytes()[..64]),
        Err(Error::Signature {
            role: Role::Sender,
            source: RecoveryError::InvalidLength(64)
        })
    );
}

#[test]
fn failed_payout_leaves_channel_unchanged() {
    let mut s = Setup::funded(500);
    let before = s.channel;
    s.token.reject_recipient(Some(s.receiver.address()));

    assert_eq!(s.withdraw(100), Err(Error::Token(crate::token::TokenError::Rejected(TOKEN))));
    assert_eq!(s.channel, before);
}

#[test]
fn mutual_settlement_pays_both_parties() {
    let mut s = Setup::funded(500);
    s.withdraw(40).unwrap();
    let sender = s.sender.address();
    let receiver = s.receiver.address();

    let settlement = s.mutual(sender, 100).unwrap();
    assert_eq!(
        settlement,
        Settlement {
            kind: SettlementKind::Mutual,
            balance: U256::from(100u64),
            receiver_payout: U256::from(60u64),
            sender_refund: U256::from(400u64),
        }
    );
    assert_eq!(s.channel.status(), Status::Settled);
    assert_eq!(s.channel.withdrawn(), U256::from(100u64));
    assert_eq!(s.balance(receiver), U256::from(100u64));
    assert_eq!(s.balance(sender), U256::from(900u64));
    assert_eq!(s.balance(CHANNEL), U256::zero());
}

#[test]
fn mutual_settlement_at_full_deposit_skips_refund() {
    let mut s = Setup::funded(500);
    let receiver = s.receiver.address();
    // A refund to a rejected recipient would fail if it was attempted.
    s.token.reject_recipient(Some(s.sender.address()));

    let settlement = s.mutual(receiver, 500).unwrap();
    assert_eq!(settlement.sender_refund, U256::zero());
    assert_eq!(s.balance(receiver), U256::from(500u64));
}

#[test]
fn mutual_settlement_by_third_party_is_rejected() {
    let mut s = Setup::funded(500);
    let stranger = Address([0x99; 20]);
    assert_eq!(
        s.mutual(stranger, 100),
        Err(Error::Unauthorized {
            caller: stranger,
            expected: Role::Participant
        })
    );
}

#[test]
fn mutual_settlement_needs_receiver_signature() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    let sender_sig = s.withdrawal_sig(100);
    // The sender cannot produce the closing proof on its own.
    let forged = BalanceProof::closing(sender, U256::from(100u64), CHANNEL)
        .sign(&s.sender)
        .unwrap();

    assert_eq!(
        s.channel.mutual_settlement(
            &mut s.token,
            sender,
            U256::from(100u64),
            sender_sig.as_bytes(),
            forged.as_bytes(),
        ),
        Err(Error::InvalidSigner {
            expected: Role::Receiver,
            address: s.receiver.address(),
            recovered: sender,
        })
    );
    assert_eq!(s.channel.status(), Status::Recharged);
}

#[test]
fn settled_channel_rejects_everything() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    s.mutual(sender, 100).unwrap();
    let before = s.channel;

    assert!(matches!(
        s.channel.recharge(&mut s.token, sender, CHANNEL, U256::from(1u64)),
        Err(Error::InvalidStatus { .. })
    ));
    assert!(matches!(s.withdraw(200), Err(Error::InvalidStatus { .. })));
    assert!(matches!(s.mutual(sender, 200), Err(Error::InvalidStatus { .. })));
    assert!(matches!(
        s.channel.challenged_settlement(sender, U256::from(200u64), START),
        Err(Error::InvalidStatus { .. })
    ));
    assert!(matches!(
        s.channel
            .after_challenge_settlement(&mut s.token, sender, u64::MAX),
        Err(Error::InvalidStatus { .. })
    ));
    assert_eq!(s.channel, before);
}

#[test]
fn challenge_then_finalize_after_period() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    let receiver = s.receiver.address();

    let challenge = s
        .channel
        .challenged_settlement(sender, U256::from(200u64), START + 10)
        .unwrap();
    assert_eq!(challenge.ends_at(), START + 10 + PERIOD);
    assert_eq!(s.channel.status(), Status::InChallenge);
    assert_eq!(s.channel.challenge(), Some(challenge));

    assert_eq!(
        s.channel
            .after_challenge_settlement(&mut s.token, sender, START + 10 + PERIOD - 1),
        Err(Error::ChallengeNotExpired {
            ends_at: START + 10 + PERIOD,
            now: START + 10 + PERIOD - 1
        })
    );

    let settlement = s
        .channel
        .after_challenge_settlement(&mut s.token, sender, START + 10 + PERIOD)
        .unwrap();
    assert_eq!(settlement.kind, SettlementKind::Challenged);
    assert_eq!(settlement.receiver_payout, U256::from(200u64));
    assert_eq!(settlement.sender_refund, U256::from(300u64));
    assert_eq!(s.balance(receiver), U256::from(200u64));
    assert_eq!(s.balance(sender), U256::from(800u64));
    assert_eq!(s.channel.status(), Status::Settled);
    assert_eq!(s.channel.challenge(), None);
}

#[test]
fn challenge_finalize_pays_only_the_unwithdrawn_part() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    let receiver = s.receiver.address();
    s.withdraw(100).unwrap();

    s.channel
        .challenged_settlement(sender, U256::from(200u64), START)
        .unwrap();
    let settlement = s
        .channel
        .after_challenge_settlement(&mut s.token, sender, START + PERIOD)
        .unwrap();

    assert_eq!(
        settlement,
        Settlement {
            kind: SettlementKind::Challenged,
            balance: U256::from(200u64),
            receiver_payout: U256::from(100u64),
            sender_refund: U256::from(300u64),
        }
    );
    assert_eq!(s.channel.withdrawn(), U256::from(200u64));
    assert_eq!(s.balance(receiver), U256::from(200u64));
    assert_eq!(s.balance(sender), U256::from(800u64));
    assert_eq!(s.balance(CHANNEL), U256::zero());
}

#[test]
fn challenge_finalize_by_receiver_is_rejected() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    let receiver = s.receiver.address();
    s.channel
        .challenged_settlement(sender, U256::from(200u64), START)
        .unwrap();

    assert_eq!(
        s.channel
            .after_challenge_settlement(&mut s.token, receiver, u64::MAX),
        Err(Error::Unauthorized {
            caller: receiver,
            expected: Role::Sender
        })
    );
}

#[test]
fn challenge_below_withdrawn_is_rejected() {
    let mut s = Setup::funded(500);
    s.withdraw(300).unwrap();
    let sender = s.sender.address();

    assert_eq!(
        s.channel.challenged_settlement(sender, U256::from(200u64), START),
        Err(Error::BalanceBelowWithdrawn {
            balance: U256::from(200u64),
            withdrawn: U256::from(300u64)
        })
    );
    assert_eq!(s.channel.status(), Status::Withdrawn);
}

#[test]
fn challenge_above_deposit_is_rejected() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    assert_eq!(
        s.channel.challenged_settlement(sender, U256::from(501u64), START),
        Err(Error::BalanceExceedsDeposit {
            balance: U256::from(501u64),
            deposit: U256::from(500u64)
        })
    );
}

#[test]
fn challenge_before_recharge_is_rejected() {
    let mut s = Setup::new();
    let sender = s.sender.address();
    assert_eq!(
        s.channel.challenged_settlement(sender, U256::zero(), START),
        Err(Error::InvalidStatus {
            operation: Operation::ChallengedSettlement,
            status: Status::Initiated
        })
    );
}

#[test]
fn withdraw_during_challenge_is_rejected() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    s.channel
        .challenged_settlement(sender, U256::from(200u64), START)
        .unwrap();

    assert_eq!(
        s.withdraw(300),
        Err(Error::InvalidStatus {
            operation: Operation::Withdraw,
            status: Status::InChallenge
        })
    );
}

#[test]
fn mutual_settlement_supersedes_challenge() {
    let mut s = Setup::funded(500);
    let sender = s.sender.address();
    let receiver = s.receiver.address();
    s.channel
        .challenged_settlement(sender, U256::from(100u64), START)
        .unwrap();

    let settlement = s.mutual(receiver, 350).unwrap();
    assert_eq!(settlement.receiver_payout, U256::from(350u64));
    assert_eq!(settlement.sender_refund, U256::from(150u64));
    assert_eq!(s.channel.status(), Status::Settled);
    assert_eq!(s.channel.challenge(), None);
}

#[test]
fn status_codes_are_stable() {
    for (code, status) in [
        (0, Status::Initiated),
        (1, Status::Recharged),
        (2, Status::Withdrawn),
        (3, Status::InChallenge),
        (4, Status::Settled),
    ] {
        assert_eq!(status.code(), code);
        assert_eq!(Status::try_from(code), Ok(status));
    }
    assert_eq!(Status::try_from(5), Err(UnknownStatus(5)));
}
