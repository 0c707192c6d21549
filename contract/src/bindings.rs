//! Solidity ABI of the multisig wallet contract.

use alloy_sol_types::sol;

sol! {
    /// Signer-set and stream management, callable only by the wallet itself.
    function addSigner(address newSigner, uint256 newSignaturesRequired) external;
    function removeSigner(address oldSigner, uint256 newSignaturesRequired) external;
    function openStream(address to, uint256 amount, uint256 frequency) external;
    function closeStream(address to) external;

    /// Replay-protected digest the signers sign.
    function getTransactionHash(uint256 _nonce, address to, uint256 value, bytes data)
        external view returns (bytes32 hash);

    function executeTransaction(address to, uint256 value, bytes data, bytes[] signatures)
        external returns (bytes result);

    function isOwner(address owner) external view returns (bool);
    function nonce() external view returns (uint256);
    function signaturesRequired() external view returns (uint256);
}
