//! Fixed external ABI surface of the entity governance contract.

use alloy_sol_types::sol;

sol! {
    /// Read and write entry points consumed by the ledger reader, role
    /// provider and lifecycle controller.
    interface IEntityGovernance {
        function multicallView(address target, bytes[] calldata calls) external view returns (bytes[] memory results);
        function isConfirmed(address entity, uint256 txIndex, address account) external view returns (bool confirmed);
        function methodCallableByRole(bytes4 method, bytes32 role) external view returns (bool callable);
        function entityToTransactions(address entity, uint256 txIndex) external view returns (address target, string memory title, bytes4 method, bytes memory dataBytes, bool executed, uint256 sigsMade, uint256 sigsNeeded);
        function entityToTransactionNonce(address entity) external view returns (uint256 nonce);
        function userRoleLookup(address account, bytes32 role) external view returns (bool held);
        function userDataBytes() external view returns (bytes memory blob);

        function confirmTransaction(uint256 txIndex, bytes32 role) external;
        function executeTransaction(uint256 txIndex, bytes32 role) external;
        function submitMulticallTransaction(address target, bytes32 role, string title, bytes[] calls) external;
    }

    /// Proof-carrying execute used when the transaction target keeps its
    /// records off-chain. Declared as its own interface so the overload gets
    /// an unambiguous generated type name.
    interface IEntityGovernanceOffchain {
        function executeTransaction(uint256 txIndex, bytes32 role, bytes calldata response, bytes calldata proof) external;
    }
}
